//! Request dispatcher.
//!
//! Awaits the readiness gate, picks the first matching route, and
//! performs the single terminal write: the route's reply, the mapped
//! execution error, or an empty 404.

use bytes::Bytes;
use http::StatusCode;
use tracing::{debug, warn};

use crate::chain::DispatchChain;
use crate::error::DispatchError;
use crate::error_mapper::{self, ErrorCallback};
use crate::readiness::ReadinessGate;
use crate::request::IncomingRequest;
use crate::response::OutgoingResponse;

pub struct RequestDispatcher {
    gate: ReadinessGate,
    chain: DispatchChain,
    on_error: Option<ErrorCallback>,
}

impl RequestDispatcher {
    pub fn new(gate: ReadinessGate, chain: DispatchChain, on_error: Option<ErrorCallback>) -> Self {
        Self {
            gate,
            chain,
            on_error,
        }
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    pub fn chain(&self) -> &DispatchChain {
        &self.chain
    }

    /// Classify and answer one request.
    ///
    /// Returns `Err` only when the engine failed to start; otherwise the
    /// returned response has exactly one terminal write.
    pub async fn dispatch(&self, req: &IncomingRequest) -> Result<OutgoingResponse, DispatchError> {
        self.gate.await_ready().await?;

        let mut res = OutgoingResponse::new();

        let Some(route) = self.chain.select(req) else {
            debug!(method = %req.method(), path = req.path(), "no route matched");
            if let Err(e) = res.send(StatusCode::NOT_FOUND, Bytes::new()) {
                warn!(error = %e, "could not send 404");
            }
            return Ok(res);
        };

        debug!(route = route.name(), method = %req.method(), path = req.path(), "dispatching");
        match route.handle(req).await {
            Ok(reply) => {
                let status = reply.status;
                if let Err(e) = reply.write_to(&mut res) {
                    warn!(route = route.name(), error = %e, "could not write reply");
                }
                debug!(route = route.name(), status = status.as_u16(), "request handled");
            }
            Err(err) => error_mapper::respond(req, &mut res, &err, self.on_error.as_ref()),
        }

        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxFuture;
    use crate::chain::Route;
    use crate::error::{ExecutionError, StartupError};
    use crate::response::Reply;
    use http::Method;
    use std::sync::Arc;

    struct Always(Result<Reply, ExecutionError>);

    impl Route for Always {
        fn name(&self) -> &'static str {
            "always"
        }

        fn matches(&self, req: &IncomingRequest) -> bool {
            req.path() == "/graphql"
        }

        fn handle<'a>(&'a self, _req: &'a IncomingRequest) -> BoxFuture<'a, Result<Reply, ExecutionError>> {
            let result = self.0.clone();
            Box::pin(async move { result })
        }
    }

    fn dispatcher(result: Result<Reply, ExecutionError>, on_error: Option<ErrorCallback>) -> RequestDispatcher {
        RequestDispatcher::new(
            ReadinessGate::ready(),
            DispatchChain::new().with_route(Always(result)),
            on_error,
        )
    }

    fn request(path: &str) -> IncomingRequest {
        IncomingRequest::new(Method::POST, path)
    }

    #[tokio::test]
    async fn unmatched_path_is_empty_404() {
        let res = dispatcher(Ok(Reply::empty(StatusCode::OK)), None)
            .dispatch(&request("/unknown"))
            .await
            .unwrap();

        assert_eq!(res.status(), Some(StatusCode::NOT_FOUND));
        assert!(res.body().unwrap().is_empty());
        assert_eq!(res.terminal_writes(), 1);
    }

    #[tokio::test]
    async fn matched_route_reply_is_written_once() {
        let reply = Reply::json(StatusCode::OK, serde_json::json!({"data": null}));
        let res = dispatcher(Ok(reply), None).dispatch(&request("/graphql")).await.unwrap();

        assert_eq!(res.status(), Some(StatusCode::OK));
        assert_eq!(res.terminal_writes(), 1);
    }

    #[tokio::test]
    async fn route_error_is_mapped_once() {
        let err = ExecutionError::new("Bad Request").with_status(400);
        let res = dispatcher(Err(err), None).dispatch(&request("/graphql")).await.unwrap();

        assert_eq!(res.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(res.body().unwrap().as_ref(), b"Bad Request");
        assert_eq!(res.terminal_writes(), 1);
    }

    #[tokio::test]
    async fn error_callback_write_is_the_only_write() {
        let callback: ErrorCallback = Arc::new(|_req, res, status, _err| {
            let _ = res.send(status, "custom");
        });
        let err = ExecutionError::new("Forbidden").with_status(403);
        let res = dispatcher(Err(err), Some(callback))
            .dispatch(&request("/graphql"))
            .await
            .unwrap();

        assert_eq!(res.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(res.body().unwrap().as_ref(), b"custom");
        assert_eq!(res.terminal_writes(), 1);
    }

    #[tokio::test]
    async fn failed_gate_rejects_dispatch() {
        let gate = ReadinessGate::start(async { Err(StartupError::WarmUp("no schema".into())) });
        let dispatcher = RequestDispatcher::new(gate, DispatchChain::new(), None);

        let err = dispatcher.dispatch(&request("/graphql")).await.unwrap_err();
        assert!(err.to_string().contains("no schema"));
    }
}
