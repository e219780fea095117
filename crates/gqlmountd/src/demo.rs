//! Demo schema served by the daemon.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_graphql::{Context, EmptySubscription, Object, Schema};
use gqlmount::{ExecutionOptions, OptionsFn, RequestDescriptor};
use serde_json::json;

pub type DemoSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Request header copied into the execution context.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request header that turns on debug execution.
pub const DEBUG_HEADER: &str = "x-debug";

#[derive(Default)]
struct Counter(AtomicI64);

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Greets `name`, or the world.
    async fn hello(&self, name: Option<String>) -> String {
        format!("Hello, {}!", name.as_deref().unwrap_or("world"))
    }

    async fn count(&self, ctx: &Context<'_>) -> async_graphql::Result<i64> {
        Ok(ctx.data::<Counter>()?.0.load(Ordering::SeqCst))
    }

    /// Request id resolved from the `x-request-id` header.
    async fn request_id(&self, ctx: &Context<'_>) -> Option<String> {
        let options = ctx.data::<ExecutionOptions>().ok()?;
        options.context.get("requestId")?.as_str().map(str::to_string)
    }

    async fn debug(&self, ctx: &Context<'_>) -> bool {
        ctx.data::<ExecutionOptions>().map(|o| o.debug).unwrap_or(false)
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Adds `by` to the shared counter and returns the new value.
    async fn increment(&self, ctx: &Context<'_>, #[graphql(default = 1)] by: i64) -> async_graphql::Result<i64> {
        let counter = ctx.data::<Counter>()?;
        Ok(counter.0.fetch_add(by, Ordering::SeqCst) + by)
    }
}

pub fn schema() -> DemoSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(Counter::default())
        .finish()
}

/// Options resolver reading the request id and debug flag from headers.
pub fn options() -> OptionsFn {
    Arc::new(|req: RequestDescriptor| {
        Box::pin(async move {
            let request_id = req
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            Ok(ExecutionOptions {
                context: json!({ "requestId": request_id }),
                debug: req.headers.contains_key(DEBUG_HEADER),
            })
        })
    })
}
