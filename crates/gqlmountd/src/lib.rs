//! gqlmountd — serves the demo schema through a gqlmount handler.
//!
//! The binary in `main.rs` parses the CLI and runs the server; handler
//! assembly lives here so integration tests build the same router.

pub mod demo;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gqlmount::{
    GraphQLHandler, IncomingRequest, LivenessProbe, MountSettings, ProbeError, SchemaEngine,
};
use tracing::info;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,gqlmountd=debug,gqlmount=debug";

/// Set once shutdown begins; the liveness probe fails from then on.
#[derive(Debug, Clone, Default)]
pub struct Draining(Arc<AtomicBool>);

impl Draining {
    pub fn start(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_draining(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Build the handler for `settings` around the demo schema.
pub fn build_handler(settings: MountSettings, draining: Draining) -> GraphQLHandler {
    let engine = Arc::new(SchemaEngine::new(demo::schema()));

    let probe: LivenessProbe = Arc::new(move |_req: &IncomingRequest| {
        let draining = draining.is_draining();
        Box::pin(async move {
            if draining {
                Err(ProbeError("server is draining".to_string()))
            } else {
                Ok(())
            }
        })
    });

    let config = settings
        .into_config()
        .with_liveness_probe(probe)
        .with_options(demo::options());
    info!(config = ?config, "mount configured");

    GraphQLHandler::new(engine, config)
}
