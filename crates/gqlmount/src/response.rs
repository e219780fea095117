//! Write-once response sink and the replies routes hand back to the
//! dispatcher.
//!
//! [`OutgoingResponse`] accepts any number of header assignments followed
//! by exactly one terminal write (`send`, `send_json` or `send_raw`).
//! Every terminal call is counted, including rejected second attempts,
//! so tests can assert the single-write invariant.

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;
use tracing::{error, warn};

use crate::error::SinkError;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

#[derive(Debug)]
struct Sent {
    status: StatusCode,
    body: Bytes,
}

/// Outgoing response sink.
#[derive(Debug, Default)]
pub struct OutgoingResponse {
    headers: HeaderMap,
    sent: Option<Sent>,
    terminal_writes: usize,
}

impl OutgoingResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<(), SinkError> {
        self.ensure_open()?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Apply a set of header assignments. Each name present in `headers`
    /// replaces any existing values; repeated names keep all their values.
    pub fn set_headers(&mut self, headers: &HeaderMap) -> Result<(), SinkError> {
        self.ensure_open()?;
        for name in headers.keys() {
            let mut values = headers.get_all(name).iter();
            if let Some(first) = values.next() {
                self.headers.insert(name.clone(), first.clone());
            }
            for value in values {
                self.headers.append(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Terminal: status plus a plain body. Sets `text/plain` unless a
    /// content type was already applied or the body is empty.
    pub fn send(&mut self, status: StatusCode, body: impl Into<Bytes>) -> Result<(), SinkError> {
        let body = body.into();
        self.terminate(status, body, TEXT_PLAIN)
    }

    /// Terminal: status plus a JSON body.
    pub fn send_json(&mut self, status: StatusCode, body: &Value) -> Result<(), SinkError> {
        self.terminate(status, Bytes::from(body.to_string()), APPLICATION_JSON)
    }

    /// Terminal: status plus a body with an explicit content type, which
    /// overrides any previously applied one.
    pub fn send_raw(
        &mut self,
        status: StatusCode,
        body: impl Into<Bytes>,
        content_type: HeaderValue,
    ) -> Result<(), SinkError> {
        self.terminal_writes += 1;
        self.ensure_open()?;
        self.headers.insert(CONTENT_TYPE, content_type);
        self.sent = Some(Sent {
            status,
            body: body.into(),
        });
        Ok(())
    }

    pub fn is_sent(&self) -> bool {
        self.sent.is_some()
    }

    /// Number of terminal calls made, accepted or not.
    pub fn terminal_writes(&self) -> usize {
        self.terminal_writes
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.sent.as_ref().map(|sent| sent.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.sent.as_ref().map(|sent| &sent.body)
    }

    fn terminate(
        &mut self,
        status: StatusCode,
        body: Bytes,
        default_type: &'static str,
    ) -> Result<(), SinkError> {
        self.terminal_writes += 1;
        self.ensure_open()?;
        if !body.is_empty() && !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(default_type));
        }
        self.sent = Some(Sent { status, body });
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), SinkError> {
        if self.sent.is_some() {
            warn!(writes = self.terminal_writes, "write attempted after response was sent");
            return Err(SinkError::AlreadySent);
        }
        Ok(())
    }
}

impl IntoResponse for OutgoingResponse {
    fn into_response(self) -> Response {
        let Some(sent) = self.sent else {
            error!("response dropped without a terminal write");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        let mut response = Response::new(Body::from(sent.body));
        *response.status_mut() = sent.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Body of a [`Reply`].
#[derive(Debug, Clone)]
pub enum ReplyBody {
    Empty,
    Json(Value),
    Raw { content_type: HeaderValue, body: Bytes },
}

/// What a route wants written. The dispatcher turns it into the single
/// terminal write.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ReplyBody,
}

impl Reply {
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ReplyBody::Empty,
        }
    }

    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ReplyBody::Json(body),
        }
    }

    pub fn raw(status: StatusCode, content_type: HeaderValue, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ReplyBody::Raw {
                content_type,
                body: body.into(),
            },
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Apply headers, then perform the terminal write.
    pub fn write_to(self, res: &mut OutgoingResponse) -> Result<(), SinkError> {
        res.set_headers(&self.headers)?;
        match self.body {
            ReplyBody::Empty => res.send(self.status, Bytes::new()),
            ReplyBody::Json(body) => res.send_json(self.status, &body),
            ReplyBody::Raw { content_type, body } => res.send_raw(self.status, body, content_type),
        }
    }
}
