//! HTTP type conversions between axum and the dispatcher.
//!
//! Converts an inbound axum request into an [`IncomingRequest`], parsing
//! the body according to its content type.

use std::error::Error as StdError;

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Request, StatusCode, Uri};
use http_body_util::LengthLimitError;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::request::IncomingRequest;

/// Failure to turn the raw body into a parsed value. Answered directly,
/// before dispatch.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("POST body sent invalid JSON.")]
    InvalidJson(#[source] serde_json::Error),

    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body")]
    Read(#[source] axum::Error),
}

impl IntoResponse for BodyError {
    fn into_response(self) -> Response {
        let status = match self {
            BodyError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            BodyError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            BodyError::Read(_) => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// `code` as a status, or 500 when it is outside 100..=999.
pub fn status_or_internal(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Origin-form request target (`/path?query`) of `uri`.
pub fn request_target(uri: &Uri) -> String {
    match uri.path_and_query() {
        Some(target) => target.as_str().to_owned(),
        None => "/".to_owned(),
    }
}

/// Media type of the request, lowercased, without parameters.
pub fn media_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)?
        .to_str()
        .ok()?
        .split(';')
        .next()
        .map(|s| s.trim().to_ascii_lowercase())
}

/// Parse a raw body by media type.
///
/// Empty bodies are `null`; JSON types are parsed; `application/graphql`
/// becomes `{"query": <text>}`; anything else is kept as a string.
pub fn parse_body(media_type: Option<&str>, bytes: &[u8]) -> Result<Value, BodyError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }

    match media_type {
        Some(t) if t == "application/json" || t.ends_with("+json") => {
            serde_json::from_slice(bytes).map_err(BodyError::InvalidJson)
        }
        Some("application/graphql") => Ok(json!({ "query": String::from_utf8_lossy(bytes) })),
        _ => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

/// Read and parse an axum request.
pub async fn incoming_request(req: Request<Body>, limit: usize) -> Result<IncomingRequest, BodyError> {
    let (parts, body) = req.into_parts();

    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| read_error(e, limit))?;

    let media_type = media_type(&parts.headers);
    let body = parse_body(media_type.as_deref(), &bytes)?;

    Ok(IncomingRequest::new(parts.method, request_target(&parts.uri))
        .with_headers(parts.headers)
        .with_body(body))
}

/// 413 when the body hit the limit, 400 for any other read failure.
fn read_error(err: axum::Error, limit: usize) -> BodyError {
    let mut cause: Option<&(dyn StdError + 'static)> = Some(&err);
    while let Some(e) = cause {
        if e.is::<LengthLimitError>() {
            debug!(limit, "request body over limit");
            return BodyError::TooLarge { limit };
        }
        cause = e.source();
    }
    debug!(error = %err, "failed to read request body");
    BodyError::Read(err)
}
