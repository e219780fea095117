//! Liveness endpoint.
//!
//! Response follows the health check draft
//! (draft-inadarei-api-health-check): `application/health+json` with a
//! body of `{"status":"pass"}` or `{"status":"fail"}`.

use std::fmt;
use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use crate::BoxFuture;
use crate::error::ProbeError;
use crate::request::IncomingRequest;
use crate::response::Reply;

/// Well-known liveness path.
pub const LIVENESS_PATH: &str = "/.well-known/apollo/server-health";

/// Content type of every liveness response.
pub const HEALTH_CONTENT_TYPE: &str = "application/health+json";

/// Optional liveness probe. An `Err` turns the response into a 503.
pub type LivenessProbe =
    Arc<dyn Fn(&IncomingRequest) -> BoxFuture<'static, Result<(), ProbeError>> + Send + Sync>;

/// Answers liveness requests.
#[derive(Clone, Default)]
pub struct HealthCheckHandler {
    probe: Option<LivenessProbe>,
}

impl HealthCheckHandler {
    pub fn new(probe: Option<LivenessProbe>) -> Self {
        Self { probe }
    }

    pub async fn check(&self, req: &IncomingRequest) -> Reply {
        if let Some(probe) = &self.probe {
            if let Err(e) = probe(req).await {
                warn!(error = %e, "liveness probe failed");
                return health_reply(StatusCode::SERVICE_UNAVAILABLE, "fail");
            }
        }
        debug!("liveness check passed");
        health_reply(StatusCode::OK, "pass")
    }
}

impl fmt::Debug for HealthCheckHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthCheckHandler")
            .field("probe", &self.probe.is_some())
            .finish()
    }
}

fn health_reply(status: StatusCode, outcome: &str) -> Reply {
    Reply::json(status, json!({ "status": outcome }))
        .with_header(CONTENT_TYPE, HeaderValue::from_static(HEALTH_CONTENT_TYPE))
}
