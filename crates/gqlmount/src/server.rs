//! Handler construction and axum mounting.
//!
//! [`GraphQLHandler::new`] starts the engine warm-up, builds the route
//! chain for the configured health topology and wraps it in a
//! [`RequestDispatcher`]. [`router`] mounts the handler on axum: every
//! path goes through the dispatcher via the fallback, and in the
//! standalone topology the liveness path gets its own route.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use http::StatusCode;
use tracing::{error, info};

use crate::bridge::GraphQLBridge;
use crate::chain::{DispatchChain, GraphQLRoute, HealthRoute, PlaygroundRoute};
use crate::config::{HealthTopology, MountConfig};
use crate::convert;
use crate::dispatcher::RequestDispatcher;
use crate::engine::ExecutionEngine;
use crate::error::DispatchError;
use crate::health::{HealthCheckHandler, LIVENESS_PATH};
use crate::playground::PlaygroundNegotiator;
use crate::readiness::ReadinessGate;
use crate::request::IncomingRequest;
use crate::response::OutgoingResponse;

struct HandlerInner {
    dispatcher: RequestDispatcher,
    /// Liveness handler mounted outside the chain (standalone topology).
    standalone_health: Option<HealthCheckHandler>,
    path: String,
    body_limit: usize,
}

/// A mounted GraphQL endpoint. Cheap to clone.
#[derive(Clone)]
pub struct GraphQLHandler {
    inner: Arc<HandlerInner>,
}

impl GraphQLHandler {
    /// Build the handler and kick off engine warm-up.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(engine: Arc<dyn ExecutionEngine>, config: MountConfig) -> Self {
        let gate = ReadinessGate::start(engine.will_start());

        let health = HealthCheckHandler::new(config.health.probe.clone());
        let health_enabled = !config.health.disabled;
        let topology = config.health.topology;

        let mut chain = DispatchChain::new();
        if health_enabled && topology == HealthTopology::Chained {
            chain = chain.with_route(HealthRoute::new(health.clone()));
        }

        let negotiator = Arc::new(PlaygroundNegotiator::new(
            config.path.clone(),
            config.subscriptions_path.clone(),
            config.playground.clone(),
            config.renderer.clone(),
        ));
        if negotiator.is_enabled() {
            chain = chain.with_route(PlaygroundRoute::new(config.path.clone(), negotiator));
        }

        let bridge = GraphQLBridge::new(engine, config.options.clone(), config.extraction);
        chain = chain.with_route(GraphQLRoute::new(config.path.clone(), bridge));

        let standalone_health =
            (health_enabled && topology == HealthTopology::Standalone).then_some(health);

        info!(
            path = %config.path,
            routes = ?chain.route_names(),
            standalone_health = standalone_health.is_some(),
            "graphql handler mounted"
        );

        Self {
            inner: Arc::new(HandlerInner {
                dispatcher: RequestDispatcher::new(gate, chain, config.on_error),
                standalone_health,
                path: config.path,
                body_limit: config.body_limit,
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn readiness(&self) -> &ReadinessGate {
        self.inner.dispatcher.gate()
    }

    pub fn route_names(&self) -> Vec<&'static str> {
        self.inner.dispatcher.chain().route_names()
    }

    /// Whether the liveness path is served outside the chain.
    pub fn has_standalone_health(&self) -> bool {
        self.inner.standalone_health.is_some()
    }

    /// Dispatch one request through the chain.
    pub async fn handle(&self, req: &IncomingRequest) -> Result<OutgoingResponse, DispatchError> {
        self.inner.dispatcher.dispatch(req).await
    }

    /// Answer a request on the standalone liveness route. Falls back to
    /// the chain when the health check is not mounted standalone.
    pub async fn handle_health(&self, req: &IncomingRequest) -> Result<OutgoingResponse, DispatchError> {
        let Some(health) = &self.inner.standalone_health else {
            return self.handle(req).await;
        };
        self.readiness().await_ready().await?;

        let mut res = OutgoingResponse::new();
        if let Err(e) = health.check(req).await.write_to(&mut res) {
            error!(error = %e, "could not write liveness response");
        }
        Ok(res)
    }
}

/// Mount `handler` on a new axum router.
pub fn router(handler: GraphQLHandler) -> Router {
    let mut router = Router::new();
    if handler.has_standalone_health() {
        router = router.route(LIVENESS_PATH, any(health_endpoint));
    }
    router.fallback(dispatch_endpoint).with_state(handler)
}

async fn dispatch_endpoint(State(handler): State<GraphQLHandler>, req: Request) -> Response {
    let incoming = match convert::incoming_request(req, handler.inner.body_limit).await {
        Ok(incoming) => incoming,
        Err(e) => return e.into_response(),
    };
    finish(handler.handle(&incoming).await)
}

async fn health_endpoint(State(handler): State<GraphQLHandler>, req: Request) -> Response {
    let incoming = match convert::incoming_request(req, handler.inner.body_limit).await {
        Ok(incoming) => incoming,
        Err(e) => return e.into_response(),
    };
    finish(handler.handle_health(&incoming).await)
}

fn finish(result: Result<OutgoingResponse, DispatchError>) -> Response {
    match result {
        Ok(res) => res.into_response(),
        Err(e) => {
            error!(error = %e, "request rejected");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
