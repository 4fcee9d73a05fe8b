use crate::http::request::{Method, Request};
use crate::http::response::StatusCode;
use std::collections::HashMap;

/// Upper bound on the size of a request head (request line + headers).
pub const MAX_HEAD_SIZE: usize = 2048;

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidRequest,
    InvalidMethod,
    InvalidPath,
    InvalidHeader,
    InvalidContentLength,
    UnsupportedVersion,
    HeadTooLarge,
    Incomplete,
}

impl ParseError {
    /// The status the client receives for this parse failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedVersion => StatusCode::VersionNotSupported,
            _ => StatusCode::BadRequest,
        }
    }
}

/// Parses a request head from the start of `buf`.
///
/// On success returns the request and the number of bytes consumed by the
/// head. Any bytes after that belong to the body.
pub fn parse_request_head(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let headers_end = match find_headers_end(buf) {
        Some(end) => end,
        None if buf.len() >= MAX_HEAD_SIZE => return Err(ParseError::HeadTooLarge),
        None => return Err(ParseError::Incomplete),
    };
    if headers_end + 4 > MAX_HEAD_SIZE {
        return Err(ParseError::HeadTooLarge);
    }

    let headers_str = std::str::from_utf8(&buf[..headers_end])
        .map_err(|_| ParseError::InvalidRequest)?;

    let mut lines = headers_str.split("\r\n");

    // Request line: exactly three space separated parts
    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split(' ');

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;
    if parts.next().is_some() {
        return Err(ParseError::InvalidRequest);
    }

    let method = Method::from_str(method_str).ok_or(ParseError::InvalidMethod)?;
    validate_path(path)?;
    if version != "HTTP/1.1" {
        if version.starts_with("HTTP/") {
            return Err(ParseError::UnsupportedVersion);
        }
        return Err(ParseError::InvalidRequest);
    }

    let mut headers = HashMap::new();

    for line in lines {
        let (key, value) = line
            .split_once(':')
            .ok_or(ParseError::InvalidHeader)?;

        let key = key.trim();
        if key.is_empty() || key.contains(' ') {
            return Err(ParseError::InvalidHeader);
        }

        headers.insert(key.to_string(), value.trim().to_string());
    }

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
    };

    if request.header("Content-Length").is_some() && request.content_length().is_none() {
        return Err(ParseError::InvalidContentLength);
    }
    if request.method == Method::PUT && request.content_length().is_none() {
        return Err(ParseError::InvalidContentLength);
    }

    Ok((request, headers_end + 4))
}

fn validate_path(path: &str) -> Result<(), ParseError> {
    let rest = path.strip_prefix('/').ok_or(ParseError::InvalidPath)?;
    if path.len() > 64 {
        return Err(ParseError::InvalidPath);
    }

    let allowed = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b'/');
    if !rest.bytes().all(allowed) {
        return Err(ParseError::InvalidPath);
    }
    if rest.split('/').any(|segment| segment == "..") {
        return Err(ParseError::InvalidPath);
    }

    Ok(())
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
}
