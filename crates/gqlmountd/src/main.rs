//! gqlmountd — GraphQL endpoint daemon.
//!
//! # Usage
//!
//! ```text
//! gqlmountd serve --port 4000 --config gqlmount.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gqlmount::{LIVENESS_PATH, MountSettings};
use gqlmountd::{DEFAULT_FILTER, Draining, build_handler};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "gqlmountd", about = "GraphQL endpoint daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the demo schema.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "4000")]
        port: u16,

        /// Mount settings file (TOML).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Disable the GraphQL Playground page.
        #[arg(long)]
        no_playground: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            config,
            no_playground,
        } => run_serve(port, config, no_playground).await,
    }
}

async fn run_serve(port: u16, config: Option<PathBuf>, no_playground: bool) -> anyhow::Result<()> {
    let mut settings = match &config {
        Some(path) => MountSettings::from_file(path)
            .with_context(|| format!("loading mount settings from {}", path.display()))?,
        None => MountSettings::default(),
    };
    if no_playground {
        settings.playground = None;
    }
    info!(config = ?config, "gqlmountd starting");

    let draining = Draining::default();
    let handler = build_handler(settings, draining.clone());

    // Nothing is served until the engine is up.
    if let Err(e) = handler.readiness().await_ready().await {
        error!(error = %e, "engine failed to start");
        anyhow::bail!("engine failed to start: {e}");
    }
    info!(path = handler.path(), liveness = LIVENESS_PATH, "engine ready");

    let router = gqlmount::router(handler);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
            draining.start();
        })
        .await?;

    info!("gqlmountd stopped");
    Ok(())
}
