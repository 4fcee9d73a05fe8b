use std::io::{self, Read, Write};

use nix::errno::Errno;
use tracing::warn;

use super::respond;
use crate::http::connection::Connection;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::server::context::ServerContext;

/// Creates or replaces a file under an exclusive lock.
///
/// The response goes out only after the lock is released, so a client that
/// sees 200/201 can immediately read back what it wrote.
///
/// A body shorter than Content-Length answers 400 and any other receive
/// error answers 500. Either way the file keeps whatever bytes arrived
/// before the failure; nothing is rolled back.
pub fn handle_put<S: Read + Write>(ctx: &ServerContext, conn: &mut Connection<S>, request: &Request) -> StatusCode {
    let path = ctx.resolve(&request.path);

    let mut guard = match ctx.locks().acquire_for_write(&path) {
        Ok(guard) => guard,
        Err(e) => {
            let response = Response::status_only(write_error_status(&e));
            respond(conn, &response);
            return response.status;
        }
    };

    let mut status = match guard.truncate() {
        Ok(()) => guard.success_status(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "truncate failed");
            StatusCode::InternalServerError
        }
    };

    if status != StatusCode::InternalServerError {
        // Content-Length is guaranteed for PUT by the parser.
        let len = request.content_length().unwrap_or(0);
        if let Err(e) = conn.receive_body(guard.file_mut(), len) {
            warn!(path = %path.display(), error = %e, "failed to receive body");
            status = body_error_status(&e);
        }
    }

    if let Err(e) = guard.release() {
        warn!(path = %path.display(), error = %e, "failed to release lock");
    }

    respond(conn, &Response::status_only(status));
    status
}

fn write_error_status(e: &io::Error) -> StatusCode {
    let is_dir = e.raw_os_error() == Some(Errno::EISDIR as i32);

    match e.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound => StatusCode::Forbidden,
        _ if is_dir => StatusCode::Forbidden,
        _ => StatusCode::InternalServerError,
    }
}

fn body_error_status(e: &io::Error) -> StatusCode {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => StatusCode::BadRequest,
        _ => StatusCode::InternalServerError,
    }
}
