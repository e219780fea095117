//! Execution engine seam.
//!
//! The engine validates and runs GraphQL operations. The mount only
//! calls it and interprets the result: an [`ExecutionOutput`] to send
//! with status 200, or an [`ExecutionError`] to map onto HTTP.

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;

use crate::BoxFuture;
use crate::error::{ExecutionError, StartupError};
use crate::request::RequestDescriptor;

/// Options an engine resolves per request (context, debug flag).
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    pub context: Value,
    pub debug: bool,
}

/// Resolver callback producing [`ExecutionOptions`] from request state.
pub type OptionsFn = Arc<
    dyn Fn(RequestDescriptor) -> BoxFuture<'static, Result<ExecutionOptions, ExecutionError>>
        + Send
        + Sync,
>;

/// Resolver that always yields `ExecutionOptions::default()`.
pub fn default_options() -> OptionsFn {
    Arc::new(|_| Box::pin(async { Ok(ExecutionOptions::default()) }))
}

/// Options resolver bound to one request.
///
/// Each call to [`resolve`](Self::resolve) invokes the configured
/// callback again; nothing is cached between calls or requests.
#[derive(Clone)]
pub struct OptionsResolver {
    resolve: OptionsFn,
    request: RequestDescriptor,
}

impl OptionsResolver {
    pub fn new(resolve: OptionsFn, request: RequestDescriptor) -> Self {
        Self { resolve, request }
    }

    pub async fn resolve(&self) -> Result<ExecutionOptions, ExecutionError> {
        (self.resolve)(self.request.clone()).await
    }
}

impl fmt::Debug for OptionsResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsResolver")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Everything the engine receives for one execution.
#[derive(Debug, Clone)]
pub struct ExecutionCall {
    pub method: Method,
    pub options: OptionsResolver,
    pub query: Value,
    pub request: RequestDescriptor,
}

/// Successful execution: a serializable body plus headers to apply.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutput {
    pub body: Value,
    pub headers: HeaderMap,
}

impl ExecutionOutput {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

/// A GraphQL execution engine.
pub trait ExecutionEngine: Send + Sync + 'static {
    /// Warm-up run once when the handler is built. The returned future
    /// is spawned, so it must own what it needs.
    fn will_start(&self) -> BoxFuture<'static, Result<(), StartupError>> {
        Box::pin(async { Ok(()) })
    }

    fn execute(&self, call: ExecutionCall) -> BoxFuture<'_, Result<ExecutionOutput, ExecutionError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor {
            method: Method::POST,
            url: "/graphql".to_string(),
            headers: HeaderMap::new(),
        }
    }

    #[tokio::test]
    async fn default_resolver_yields_defaults() {
        let resolver = OptionsResolver::new(default_options(), descriptor());
        let options = resolver.resolve().await.unwrap();
        assert_eq!(options.context, Value::Null);
        assert!(!options.debug);
    }

    #[tokio::test]
    async fn resolver_is_invoked_on_every_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let resolve: OptionsFn = Arc::new(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                Ok(ExecutionOptions {
                    context: serde_json::json!({ "call": n }),
                    debug: false,
                })
            })
        });

        let resolver = OptionsResolver::new(resolve, descriptor());
        let first = resolver.resolve().await.unwrap();
        let second = resolver.resolve().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.context["call"], 0);
        assert_eq!(second.context["call"], 1);
    }

    #[tokio::test]
    async fn resolver_failure_propagates() {
        let resolve: OptionsFn = Arc::new(|req: RequestDescriptor| {
            Box::pin(async move {
                if req.headers.get(http::header::AUTHORIZATION).is_none() {
                    return Err(ExecutionError::new("unauthorized").with_status(401));
                }
                Ok(ExecutionOptions::default())
            })
        });

        let err = OptionsResolver::new(resolve, descriptor()).resolve().await.unwrap_err();
        assert_eq!(err.status_code, Some(401));
    }

    #[tokio::test]
    async fn default_warm_up_succeeds() {
        struct Noop;
        impl ExecutionEngine for Noop {
            fn execute(&self, _call: ExecutionCall) -> BoxFuture<'_, Result<ExecutionOutput, ExecutionError>> {
                Box::pin(async { Ok(ExecutionOutput::default()) })
            }
        }
        assert!(Noop.will_start().await.is_ok());
    }
}
