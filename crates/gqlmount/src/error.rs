//! Error types for the GraphQL mount.

use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use thiserror::Error;

use crate::convert::status_or_internal;

/// A failure reported by the execution engine.
///
/// Carries an optional HTTP status and optional response headers that
/// are applied before the error body is sent. `Display` yields the
/// human-readable message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub name: String,
    pub status_code: Option<u16>,
    pub headers: HeaderMap,
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "HttpQueryError".to_string(),
            status_code: None,
            headers: HeaderMap::new(),
            message: message.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_status(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// The status to respond with: the carried code, or 500 when absent.
    pub fn status(&self) -> StatusCode {
        self.status_code
            .map(status_or_internal)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// The engine failed to warm up. Fatal for every waiting request.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("engine warm-up failed: {0}")]
    WarmUp(String),

    #[error("engine warm-up task ended without reporting")]
    Aborted,
}

/// A liveness probe callback reported failure.
#[derive(Debug, Error)]
#[error("liveness probe failed: {0}")]
pub struct ProbeError(pub String);

/// Misuse of the write-once response sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("response already sent")]
    AlreadySent,
}

/// The only failure a dispatch can return; every other outcome is a
/// terminal write on the response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("server failed to start: {0}")]
    Startup(#[from] Arc<StartupError>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_500() {
        let err = ExecutionError::new("boom");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn status_uses_carried_code() {
        let err = ExecutionError::new("Bad Request").with_status(400);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn out_of_range_code_falls_back_to_500() {
        let err = ExecutionError::new("weird").with_status(42);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn display_is_the_message() {
        let err = ExecutionError::new("Bad Request").with_status(400);
        assert_eq!(err.to_string(), "Bad Request");
    }

    #[test]
    fn headers_accumulate() {
        let err = ExecutionError::new("nope")
            .with_header(http::header::ALLOW, HeaderValue::from_static("GET, POST"))
            .with_header(http::header::SET_COOKIE, HeaderValue::from_static("a=1"))
            .with_header(http::header::SET_COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(err.headers.get_all(http::header::SET_COOKIE).iter().count(), 2);
        assert_eq!(err.headers.get(http::header::ALLOW).unwrap(), "GET, POST");
    }
}
