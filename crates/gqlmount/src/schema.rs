//! [`ExecutionEngine`] backed by an `async-graphql` schema.

use async_graphql::{BatchRequest, BatchResponse, ObjectType, Schema, SubscriptionType};
use http::{HeaderMap, StatusCode};
use tracing::debug;

use crate::BoxFuture;
use crate::engine::{ExecutionCall, ExecutionEngine, ExecutionOutput};
use crate::error::ExecutionError;

/// Runs operations against an `async_graphql::Schema`.
///
/// The resolved [`ExecutionOptions`](crate::ExecutionOptions) are attached
/// to the request as context data, so resolvers can read them with
/// `ctx.data::<ExecutionOptions>()`.
pub struct SchemaEngine<Query, Mutation, Subscription> {
    schema: Schema<Query, Mutation, Subscription>,
}

impl<Query, Mutation, Subscription> SchemaEngine<Query, Mutation, Subscription> {
    pub fn new(schema: Schema<Query, Mutation, Subscription>) -> Self {
        Self { schema }
    }
}

impl<Query, Mutation, Subscription> ExecutionEngine for SchemaEngine<Query, Mutation, Subscription>
where
    Query: ObjectType + 'static,
    Mutation: ObjectType + 'static,
    Subscription: SubscriptionType + 'static,
{
    fn execute(&self, call: ExecutionCall) -> BoxFuture<'_, Result<ExecutionOutput, ExecutionError>> {
        Box::pin(async move {
            let options = call.options.resolve().await?;

            let batch: BatchRequest = serde_json::from_value(call.query).map_err(|e| {
                ExecutionError::new(format!("invalid GraphQL request: {e}"))
                    .with_status(StatusCode::BAD_REQUEST.as_u16())
            })?;
            let batch = batch.data(options);

            let response = self.schema.execute_batch(batch).await;
            let headers = response_headers(&response);
            let body = serde_json::to_value(&response)
                .map_err(|e| ExecutionError::new(format!("failed to serialize response: {e}")))?;

            debug!(method = %call.method, headers = headers.len(), "schema executed");
            Ok(ExecutionOutput { body, headers })
        })
    }
}

fn response_headers(response: &BatchResponse) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match response {
        BatchResponse::Single(resp) => headers.extend(resp.http_headers.clone()),
        BatchResponse::Batch(resps) => {
            for resp in resps {
                for (name, value) in resp.http_headers.iter() {
                    headers.append(name.clone(), value.clone());
                }
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ExecutionOptions, OptionsResolver, OptionsFn, default_options};
    use crate::request::RequestDescriptor;
    use async_graphql::{Context, EmptyMutation, EmptySubscription, Object};
    use http::Method;
    use serde_json::{Value, json};
    use std::sync::Arc;

    struct Query;

    #[Object]
    impl Query {
        async fn hello(&self) -> String {
            "world".to_string()
        }

        async fn debug(&self, ctx: &Context<'_>) -> bool {
            ctx.data::<ExecutionOptions>().map(|o| o.debug).unwrap_or(false)
        }

        async fn tagged(&self, ctx: &Context<'_>) -> bool {
            ctx.insert_http_header("x-tagged", "yes");
            true
        }
    }

    fn engine() -> SchemaEngine<Query, EmptyMutation, EmptySubscription> {
        SchemaEngine::new(Schema::new(Query, EmptyMutation, EmptySubscription))
    }

    fn call(query: Value, options: OptionsFn) -> ExecutionCall {
        let request = RequestDescriptor {
            method: Method::POST,
            url: "/graphql".to_string(),
            headers: HeaderMap::new(),
        };
        ExecutionCall {
            method: Method::POST,
            options: OptionsResolver::new(options, request.clone()),
            query,
            request,
        }
    }

    #[tokio::test]
    async fn executes_single_request() {
        let output = engine()
            .execute(call(json!({"query": "{ hello __typename }"}), default_options()))
            .await
            .unwrap();
        assert_eq!(output.body, json!({"data": {"hello": "world", "__typename": "Query"}}));
    }

    #[tokio::test]
    async fn executes_batch_request() {
        let output = engine()
            .execute(call(json!([{"query": "{ hello }"}, {"query": "{ __typename }"}]), default_options()))
            .await
            .unwrap();
        assert_eq!(
            output.body,
            json!([{"data": {"hello": "world"}}, {"data": {"__typename": "Query"}}])
        );
    }

    #[tokio::test]
    async fn resolved_options_reach_resolvers() {
        let options: OptionsFn = Arc::new(|_| {
            Box::pin(async {
                Ok(ExecutionOptions {
                    debug: true,
                    ..Default::default()
                })
            })
        });
        let output = engine()
            .execute(call(json!({"query": "{ debug }"}), options))
            .await
            .unwrap();
        assert_eq!(output.body, json!({"data": {"debug": true}}));
    }

    #[tokio::test]
    async fn resolver_headers_are_forwarded() {
        let output = engine()
            .execute(call(json!({"query": "{ tagged }"}), default_options()))
            .await
            .unwrap();
        assert_eq!(output.headers.get("x-tagged").unwrap(), "yes");
    }

    #[tokio::test]
    async fn malformed_payload_is_400() {
        let err = engine()
            .execute(call(json!("not a request"), default_options()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code, Some(400));
    }

    #[tokio::test]
    async fn options_failure_short_circuits() {
        let options: OptionsFn = Arc::new(|_| {
            Box::pin(async { Err(ExecutionError::new("unauthorized").with_status(401)) })
        });
        let err = engine()
            .execute(call(json!({"query": "{ hello }"}), options))
            .await
            .unwrap_err();
        assert_eq!(err.status_code, Some(401));
    }
}
