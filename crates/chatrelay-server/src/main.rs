//! chatrelay server binary.
//!
//! Loads config, binds the listener, and relays until SIGINT/SIGTERM.

use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatrelay_core::error::Result;
use chatrelay_server::{config, supervisor, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "chatrelay-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load()?;
    let listener = supervisor::bind(&cfg.server).await?;
    let local = listener.local_addr()?;
    tracing::info!(%local, "chatrelay-server listening");

    let app = AppState::new(cfg);
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        supervisor::shutdown_signal().await;
        trigger.cancel();
    });

    supervisor::serve(listener, app, shutdown).await
}
