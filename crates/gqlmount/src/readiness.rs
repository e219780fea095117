//! Readiness gate: one-shot barrier on engine warm-up.
//!
//! The warm-up future is spawned when the gate is created, so it runs
//! whether or not a request has arrived. Any number of requests may
//! wait on the gate concurrently; they all resume once the warm-up
//! settles and all observe the same failure if it failed.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::error::StartupError;

#[derive(Debug, Clone)]
enum GateState {
    Pending,
    Ready,
    Failed(Arc<StartupError>),
}

/// Cloneable handle on the warm-up outcome.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    rx: watch::Receiver<GateState>,
}

impl ReadinessGate {
    /// Spawn `warm_up` on the current tokio runtime and return the gate
    /// that resolves when it settles.
    pub fn start<F>(warm_up: F) -> Self
    where
        F: Future<Output = Result<(), StartupError>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(GateState::Pending);

        tokio::spawn(async move {
            let state = match warm_up.await {
                Ok(()) => {
                    info!("engine warm-up complete");
                    GateState::Ready
                }
                Err(e) => {
                    error!(error = %e, "engine warm-up failed");
                    GateState::Failed(Arc::new(e))
                }
            };
            tx.send_replace(state);
        });

        Self { rx }
    }

    /// A gate that is already open.
    pub fn ready() -> Self {
        let (_tx, rx) = watch::channel(GateState::Ready);
        Self { rx }
    }

    /// Wait until warm-up settles.
    pub async fn await_ready(&self) -> Result<(), Arc<StartupError>> {
        let mut rx = self.rx.clone();
        let settled = rx
            .wait_for(|state| !matches!(state, GateState::Pending))
            .await
            .map(|state| (*state).clone());

        match settled {
            Ok(GateState::Failed(e)) => Err(e),
            Ok(_) => Ok(()),
            // Sender dropped while still pending: the warm-up task panicked.
            Err(_) => Err(Arc::new(StartupError::Aborted)),
        }
    }

    /// Whether warm-up has completed successfully.
    pub fn is_ready(&self) -> bool {
        matches!(*self.rx.borrow(), GateState::Ready)
    }
}
