//! Ordered route chain.
//!
//! A [`DispatchChain`] is a list of predicate/handler pairs evaluated in
//! order; the first route whose predicate matches handles the request.
//! Both health check topologies are expressed by which routes the chain
//! is built with.

use std::sync::Arc;

use crate::BoxFuture;
use crate::bridge::GraphQLBridge;
use crate::error::ExecutionError;
use crate::health::{HealthCheckHandler, LIVENESS_PATH};
use crate::playground::PlaygroundNegotiator;
use crate::request::IncomingRequest;
use crate::response::Reply;

/// One entry in the chain.
pub trait Route: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn matches(&self, req: &IncomingRequest) -> bool;

    fn handle<'a>(&'a self, req: &'a IncomingRequest) -> BoxFuture<'a, Result<Reply, ExecutionError>>;
}

#[derive(Default)]
pub struct DispatchChain {
    routes: Vec<Box<dyn Route>>,
}

impl DispatchChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, route: impl Route + 'static) -> Self {
        self.routes.push(Box::new(route));
        self
    }

    /// First route matching `req`, if any.
    pub fn select(&self, req: &IncomingRequest) -> Option<&dyn Route> {
        self.routes
            .iter()
            .find(|route| route.matches(req))
            .map(|route| route.as_ref())
    }

    pub fn route_names(&self) -> Vec<&'static str> {
        self.routes.iter().map(|route| route.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Liveness check on the well-known path, any method.
pub struct HealthRoute {
    handler: HealthCheckHandler,
}

impl HealthRoute {
    pub fn new(handler: HealthCheckHandler) -> Self {
        Self { handler }
    }
}

impl Route for HealthRoute {
    fn name(&self) -> &'static str {
        "health"
    }

    fn matches(&self, req: &IncomingRequest) -> bool {
        req.path() == LIVENESS_PATH
    }

    fn handle<'a>(&'a self, req: &'a IncomingRequest) -> BoxFuture<'a, Result<Reply, ExecutionError>> {
        Box::pin(async move { Ok(self.handler.check(req).await) })
    }
}

/// Exploration page on the mount path for HTML-preferring GETs.
pub struct PlaygroundRoute {
    path: String,
    negotiator: Arc<PlaygroundNegotiator>,
}

impl PlaygroundRoute {
    pub fn new(path: impl Into<String>, negotiator: Arc<PlaygroundNegotiator>) -> Self {
        Self {
            path: path.into(),
            negotiator,
        }
    }
}

impl Route for PlaygroundRoute {
    fn name(&self) -> &'static str {
        "playground"
    }

    fn matches(&self, req: &IncomingRequest) -> bool {
        req.path() == self.path && self.negotiator.wants_playground(req)
    }

    fn handle<'a>(&'a self, req: &'a IncomingRequest) -> BoxFuture<'a, Result<Reply, ExecutionError>> {
        Box::pin(async move {
            self.negotiator
                .try_render(req)
                .ok_or_else(|| ExecutionError::new("playground declined a matched request"))
        })
    }
}

/// GraphQL execution on the mount path.
pub struct GraphQLRoute {
    path: String,
    bridge: GraphQLBridge,
}

impl GraphQLRoute {
    pub fn new(path: impl Into<String>, bridge: GraphQLBridge) -> Self {
        Self {
            path: path.into(),
            bridge,
        }
    }
}

impl Route for GraphQLRoute {
    fn name(&self) -> &'static str {
        "graphql"
    }

    fn matches(&self, req: &IncomingRequest) -> bool {
        req.path() == self.path
    }

    fn handle<'a>(&'a self, req: &'a IncomingRequest) -> BoxFuture<'a, Result<Reply, ExecutionError>> {
        Box::pin(self.bridge.execute(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};

    struct Fixed {
        name: &'static str,
        prefix: &'static str,
    }

    impl Route for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn matches(&self, req: &IncomingRequest) -> bool {
            req.path().starts_with(self.prefix)
        }

        fn handle<'a>(&'a self, _req: &'a IncomingRequest) -> BoxFuture<'a, Result<Reply, ExecutionError>> {
            Box::pin(async { Ok(Reply::empty(StatusCode::NO_CONTENT)) })
        }
    }

    fn chain() -> DispatchChain {
        DispatchChain::new()
            .with_route(Fixed { name: "specific", prefix: "/a/b" })
            .with_route(Fixed { name: "broad", prefix: "/a" })
    }

    #[test]
    fn first_match_wins() {
        let req = IncomingRequest::new(Method::GET, "/a/b/c");
        assert_eq!(chain().select(&req).unwrap().name(), "specific");
    }

    #[test]
    fn later_route_catches_the_rest() {
        let req = IncomingRequest::new(Method::GET, "/a/z");
        assert_eq!(chain().select(&req).unwrap().name(), "broad");
    }

    #[test]
    fn no_match_is_none() {
        let req = IncomingRequest::new(Method::GET, "/elsewhere");
        assert!(chain().select(&req).is_none());
    }

    #[test]
    fn route_names_keep_order() {
        let chain = chain();
        assert_eq!(chain.route_names(), vec!["specific", "broad"]);
        assert_eq!(chain.len(), 2);
        assert!(!chain.is_empty());
        assert!(DispatchChain::new().is_empty());
    }

    #[test]
    fn health_route_matches_liveness_path_with_query() {
        let route = HealthRoute::new(HealthCheckHandler::default());
        assert!(route.matches(&IncomingRequest::new(Method::GET, LIVENESS_PATH)));
        assert!(route.matches(&IncomingRequest::new(Method::GET, format!("{LIVENESS_PATH}?x=1"))));
        assert!(!route.matches(&IncomingRequest::new(Method::GET, "/graphql")));
    }

    #[tokio::test]
    async fn selected_route_handles() {
        let chain = chain();
        let req = IncomingRequest::new(Method::GET, "/a");
        let reply = chain.select(&req).unwrap().handle(&req).await.unwrap();
        assert_eq!(reply.status, StatusCode::NO_CONTENT);
    }
}
