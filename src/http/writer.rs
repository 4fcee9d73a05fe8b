use std::io::{self, Write};

use crate::http::response::{Response, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.1";

fn serialize_head(status: StatusCode, headers: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Vec::new();

    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    for (k, v) in headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let headers: Vec<(&str, &str)> = resp
        .headers
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let mut buf = serialize_head(resp.status, &headers);
    buf.extend_from_slice(&resp.body);
    buf
}

/// The head written before streaming a file body of `len` bytes.
pub fn file_response_head(len: u64) -> Vec<u8> {
    let len = len.to_string();
    serialize_head(StatusCode::Ok, &[("Content-Length", &len)])
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn write_to<W: Write>(&mut self, stream: &mut W) -> io::Result<()> {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..])?;

            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection closed while writing",
                ));
            }

            self.written += n;
        }

        stream.flush()
    }
}
