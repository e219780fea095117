//! gqlmount — mounts a single GraphQL endpoint onto an HTTP server.
//!
//! Every request that reaches the handler is classified exactly once by
//! an ordered chain of routes and produces exactly one terminal write.
//!
//! # Architecture
//!
//! ```text
//! axum fallback / liveness route
//!   │
//!   ▼
//! convert::incoming_request()        (axum Request → IncomingRequest)
//!   │
//!   ▼
//! RequestDispatcher
//!   ├── ReadinessGate::await_ready()  (engine warm-up barrier)
//!   ├── DispatchChain (first match wins)
//!   │   ├── HealthRoute     /.well-known/apollo/server-health  (chained topology)
//!   │   ├── PlaygroundRoute GET + Accept prefers text/html
//!   │   └── GraphQLRoute    GraphQLBridge → ExecutionEngine
//!   ├── 404 fallback
//!   └── error_mapper::respond() on ExecutionError
//!   │
//!   ▼
//! OutgoingResponse (single terminal write) → axum Response
//! ```
//!
//! Handlers never write to the response themselves. They return a
//! [`Reply`] or an [`ExecutionError`] and the dispatcher performs the
//! one terminal write.

pub mod accept;
pub mod bridge;
pub mod chain;
pub mod config;
pub mod convert;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod error_mapper;
pub mod health;
pub mod playground;
pub mod readiness;
pub mod request;
pub mod response;
pub mod schema;
pub mod server;

use std::future::Future;
use std::pin::Pin;

pub use bridge::GraphQLBridge;
pub use chain::{DispatchChain, Route};
pub use config::{HealthCheck, HealthTopology, MountConfig, MountSettings, QueryExtraction};
pub use dispatcher::RequestDispatcher;
pub use engine::{
    ExecutionCall, ExecutionEngine, ExecutionOptions, ExecutionOutput, OptionsFn, OptionsResolver,
};
pub use error::{DispatchError, ExecutionError, ProbeError, SinkError, StartupError};
pub use error_mapper::ErrorCallback;
pub use health::{HealthCheckHandler, LivenessProbe, LIVENESS_PATH};
pub use playground::{
    GraphQLPlaygroundRenderer, PlaygroundNegotiator, PlaygroundOptions, PlaygroundPage,
    PlaygroundRenderer,
};
pub use readiness::ReadinessGate;
pub use request::{IncomingRequest, RequestDescriptor};
pub use response::{OutgoingResponse, Reply};
pub use schema::SchemaEngine;
pub use server::{router, GraphQLHandler};

/// Default mount path for GraphQL execution.
pub const DEFAULT_PATH: &str = "/graphql";

/// Boxed, sendable future used at the collaborator seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
