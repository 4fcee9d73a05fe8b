use std::io::{self, Read, Write};

use tracing::warn;

use super::respond;
use crate::http::connection::Connection;
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::server::context::ServerContext;

/// Serves a file under a shared lock.
///
/// Directories are refused with 403. A successful GET is always 200: a
/// read-only open never creates the file, so the Created branch cannot
/// occur here.
pub fn handle_get<S: Read + Write>(ctx: &ServerContext, conn: &mut Connection<S>, request: &Request) -> StatusCode {
    let path = ctx.resolve(&request.path);

    let mut guard = match ctx.locks().acquire_for_read(&path) {
        Ok(guard) => guard,
        Err(e) => {
            let response = Response::status_only(read_error_status(&e));
            respond(conn, &response);
            return response.status;
        }
    };

    let metadata = match guard.file().metadata() {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "stat failed");
            drop(guard);
            respond(conn, &Response::internal_error());
            return StatusCode::InternalServerError;
        }
    };

    let status = if metadata.is_dir() {
        respond(conn, &Response::forbidden());
        StatusCode::Forbidden
    } else {
        match conn.send_file(guard.file_mut(), metadata.len()) {
            Ok(()) => StatusCode::Ok,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to send file");
                StatusCode::InternalServerError
            }
        }
    };

    if let Err(e) = guard.release() {
        warn!(path = %path.display(), error = %e, "failed to release lock");
    }
    status
}

fn read_error_status(e: &io::Error) -> StatusCode {
    match e.kind() {
        io::ErrorKind::NotFound => StatusCode::NotFound,
        io::ErrorKind::PermissionDenied => StatusCode::Forbidden,
        _ => StatusCode::InternalServerError,
    }
}
