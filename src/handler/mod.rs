//! Per-connection dispatch.
//!
//! `handle_connection` drives one connection from accept to close: parse the
//! head, route by method, make sure exactly one response goes out, write the
//! audit line and drop the stream.

mod get;
mod put;

use std::io::{Read, Write};
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::audit::AuditRecord;
use crate::http::connection::{Connection, ReadError};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::server::context::ServerContext;

pub use get::handle_get;
pub use put::handle_put;

/// Handles a single connection to completion.
///
/// The stream is dropped (closed) on every path, including parse failures
/// and panics inside a method handler.
pub fn handle_connection<S: Read + Write>(ctx: &ServerContext, stream: S) {
    let mut conn = Connection::new(stream);
    serve(ctx, &mut conn);
    drop(conn.close());
}

fn serve<S: Read + Write>(ctx: &ServerContext, conn: &mut Connection<S>) {
    let request = match conn.read_request() {
        Ok(request) => request,
        Err(ReadError::Parse(e)) => {
            debug!(error = ?e, "rejecting malformed request");
            respond(conn, &Response::status_only(e.status()));
            return;
        }
        Err(ReadError::Closed) => {
            debug!("client closed before sending a request");
            return;
        }
        Err(ReadError::Io(e)) => {
            warn!(error = %e, "failed to read request");
            return;
        }
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| dispatch(ctx, conn, &request)));
    let status = match outcome {
        Ok(status) => status,
        Err(_) => {
            error!(method = %request.method, path = %request.path, "handler panicked");
            if !conn.has_responded() {
                respond(conn, &Response::internal_error());
            }
            StatusCode::InternalServerError
        }
    };

    ctx.audit().record(&AuditRecord::new(&request, status));
}

/// Routes by method and returns the status to audit.
fn dispatch<S: Read + Write>(ctx: &ServerContext, conn: &mut Connection<S>, request: &Request) -> StatusCode {
    match request.method {
        Method::GET => handle_get(ctx, conn, request),
        Method::PUT => handle_put(ctx, conn, request),
        Method::Other(_) => handle_unsupported(conn),
    }
}

/// Any method other than GET or PUT. Never touches the filesystem.
pub fn handle_unsupported<S: Read + Write>(conn: &mut Connection<S>) -> StatusCode {
    let response = Response::not_implemented();
    respond(conn, &response);
    response.status
}

/// Sends `response`; a failed send only gets logged since the client is
/// usually gone by then.
pub(crate) fn respond<S: Read + Write>(conn: &mut Connection<S>, response: &Response) {
    if let Err(e) = conn.send_response(response) {
        debug!(error = %e, status = response.status.as_u16(), "failed to send response");
    }
}
