//! Maps execution failures onto the response.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use tracing::warn;

use crate::error::ExecutionError;
use crate::request::IncomingRequest;
use crate::response::OutgoingResponse;

/// Caller-supplied error presenter. When configured it owns the terminal
/// write for failed executions.
pub type ErrorCallback = Arc<
    dyn Fn(&IncomingRequest, &mut OutgoingResponse, StatusCode, &ExecutionError) + Send + Sync,
>;

/// Write the response for a failed execution.
///
/// Headers carried by the failure are applied first. The status is the
/// failure's own code, or 500. With a callback the callback writes;
/// otherwise the message is sent as the body. At most one terminal write
/// happens here.
pub fn respond(
    req: &IncomingRequest,
    res: &mut OutgoingResponse,
    err: &ExecutionError,
    on_error: Option<&ErrorCallback>,
) {
    let status = err.status();
    warn!(
        status = status.as_u16(),
        name = %err.name,
        error = %err,
        path = req.path(),
        "graphql execution failed"
    );

    if let Err(e) = res.set_headers(&err.headers) {
        warn!(error = %e, "could not apply error headers");
    }

    match on_error {
        Some(callback) => {
            callback(req, res, status, err);
            if !res.is_sent() {
                warn!(status = status.as_u16(), "error callback left response open");
                let _ = res.send(status, Bytes::new());
            }
        }
        None => {
            if let Err(e) = res.send(status, err.message.clone()) {
                warn!(error = %e, "could not send error response");
            }
        }
    }
}
