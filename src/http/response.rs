use std::collections::HashMap;

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): existing file read or replaced
/// - `Created` (201): file created by a PUT
/// - `BadRequest` (400): malformed request head or short body
/// - `Forbidden` (403): directory target or permission denied
/// - `NotFound` (404): GET of a missing file
/// - `InternalServerError` (500): unclassified OS error
/// - `NotImplemented` (501): any method other than GET/PUT
/// - `VersionNotSupported` (505): request version other than HTTP/1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    /// 505 Version Not Supported
    VersionNotSupported,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use fileserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::VersionNotSupported => 505,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::VersionNotSupported => "Version Not Supported",
        }
    }
}

/// A complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Response body as bytes
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use fileserve::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .body(b"OK\n".to_vec())
///     .build();
/// assert_eq!(response.headers["Content-Length"], "3");
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Sets the response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response.
    ///
    /// Sets Content-Length to the body length.
    pub fn build(mut self) -> Response {
        self.headers
            .insert("Content-Length".to_string(), self.body.len().to_string());

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// A status-only response whose body is the reason phrase and a newline.
    pub fn status_only(status: StatusCode) -> Self {
        ResponseBuilder::new(status)
            .body(format!("{}\n", status.reason_phrase()).into_bytes())
            .build()
    }

    pub fn forbidden() -> Self {
        Self::status_only(StatusCode::Forbidden)
    }

    pub fn not_found() -> Self {
        Self::status_only(StatusCode::NotFound)
    }

    pub fn internal_error() -> Self {
        Self::status_only(StatusCode::InternalServerError)
    }

    pub fn not_implemented() -> Self {
        Self::status_only(StatusCode::NotImplemented)
    }
}
