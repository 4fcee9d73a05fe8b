use std::io::{self, Read, Write};

use bytes::{Buf, BytesMut};

use crate::http::parser::{parse_request_head, ParseError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::{file_response_head, ResponseWriter};

/// Why a request could not be read off the connection.
#[derive(Debug)]
pub enum ReadError {
    /// Malformed head; the client gets `ParseError::status()`.
    Parse(ParseError),
    /// Peer closed before sending a full head.
    Closed,
    Io(io::Error),
}

impl From<io::Error> for ReadError {
    fn from(e: io::Error) -> Self {
        ReadError::Io(e)
    }
}

/// One accepted client connection.
///
/// Generic over the stream so the handler can run against anything that
/// reads and writes bytes. Exactly one response may be sent per connection;
/// later attempts are refused.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Accepted,
    Parsing,
    Dispatching,
    Responded,
    Closed,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            state: ConnectionState::Accepted,
        }
    }

    pub fn has_responded(&self) -> bool {
        matches!(self.state, ConnectionState::Responded | ConnectionState::Closed)
    }

    /// Reads and parses the request head.
    ///
    /// Body bytes that arrive in the same reads stay buffered for
    /// [`receive_body`](Self::receive_body).
    pub fn read_request(&mut self) -> Result<Request, ReadError> {
        self.state = ConnectionState::Parsing;

        loop {
            match parse_request_head(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    self.state = ConnectionState::Dispatching;
                    return Ok(request);
                }

                Err(ParseError::Incomplete) => {
                    // Need more data
                }

                Err(e) => return Err(ReadError::Parse(e)),
            }

            let mut temp = [0u8; 1024];
            let n = self.stream.read(&mut temp)?;

            if n == 0 {
                return Err(ReadError::Closed);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }

    /// Sends `response`, unless a response already went out.
    pub fn send_response(&mut self, response: &Response) -> io::Result<()> {
        self.begin_response()?;
        ResponseWriter::new(response).write_to(&mut self.stream)
    }

    /// Sends a 200 head followed by exactly `len` bytes read from `src`.
    pub fn send_file<R: Read>(&mut self, src: &mut R, len: u64) -> io::Result<()> {
        self.begin_response()?;
        self.stream.write_all(&file_response_head(len))?;

        let copied = io::copy(&mut src.take(len), &mut self.stream)?;
        if copied < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank while sending: {copied} of {len} bytes"),
            ));
        }

        self.stream.flush()
    }

    /// Copies exactly `len` body bytes from the client into `dst`.
    ///
    /// Fails with `UnexpectedEof` if the client closes early.
    pub fn receive_body<W: Write>(&mut self, dst: &mut W, len: u64) -> io::Result<()> {
        let buffered = self.buffer.len().min(usize::try_from(len).unwrap_or(usize::MAX));
        dst.write_all(&self.buffer[..buffered])?;
        self.buffer.advance(buffered);

        let remaining = len - buffered as u64;
        let copied = io::copy(&mut (&mut self.stream).take(remaining), dst)?;
        if copied < remaining {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("body ended after {} of {len} bytes", buffered as u64 + copied),
            ));
        }

        dst.flush()
    }

    /// Closes the connection, returning the underlying stream.
    pub fn close(mut self) -> S {
        self.state = ConnectionState::Closed;
        self.stream
    }

    fn begin_response(&mut self) -> io::Result<()> {
        if self.has_responded() {
            return Err(io::Error::other("response already sent"));
        }
        self.state = ConnectionState::Responded;
        Ok(())
    }
}
