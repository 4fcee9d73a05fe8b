use std::collections::HashMap;

/// HTTP request methods.
///
/// Only GET and PUT are served. Any other syntactically valid method is
/// carried as `Other` so the dispatcher can answer it with 501.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Read a file
    GET,
    /// PUT - Create or replace a file
    PUT,
    /// Any other method token (DELETE, POST, ...)
    Other(String),
}

/// Represents a parsed HTTP request head.
///
/// The body is never buffered here; PUT bodies are streamed straight into
/// the target file by the connection.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request path (e.g., "/foo.txt")
    pub path: String,
    /// HTTP version (always "HTTP/1.1" once parsed)
    pub version: String,
    /// Request headers as key-value pairs
    pub headers: HashMap<String, String>,
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Tokens must be 1 to 8 ASCII letters. GET and PUT map to their own
    /// variants; anything else well-formed becomes `Other`.
    ///
    /// # Example
    ///
    /// ```
    /// # use fileserve::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("DELETE"), Some(Method::Other("DELETE".into())));
    /// assert_eq!(Method::from_str("G3T"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        if s.is_empty() || s.len() > 8 || !s.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }

        match s {
            "GET" => Some(Method::GET),
            "PUT" => Some(Method::PUT),
            other => Some(Method::Other(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::PUT => "PUT",
            Method::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Request {
    /// Retrieves a header value by name, ignoring ASCII case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Parses the Content-Length header.
    ///
    /// Returns `None` if the header is missing or not a valid number.
    pub fn content_length(&self) -> Option<u64> {
        self.header("Content-Length").and_then(|v| v.parse().ok())
    }

    /// The client-supplied `Request-Id` header, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.header("Request-Id")
    }
}
