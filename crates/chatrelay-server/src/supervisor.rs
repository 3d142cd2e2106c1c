//! Server supervisor: accept loop, session spawning, and shutdown.
//!
//! Shutdown is cooperative. The token stops the accept loop and is handed
//! (as a child token) to every session, which notices it between records.
//! With `shutdown.drain_timeout_ms = 0` the supervisor returns right away and
//! sessions still blocked on a read are dropped with the runtime.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use chatrelay_core::error::{ChatError, Result};

use crate::app_state::AppState;
use crate::config::ServerSection;
use crate::transport::run_session;

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Bind the listener. Failure here is fatal for the process.
pub async fn bind(cfg: &ServerSection) -> Result<TcpListener> {
    TcpListener::bind(cfg.listen.as_str()).await.map_err(|e| {
        ChatError::Io(std::io::Error::new(
            e.kind(),
            format!("bind {} failed: {e}", cfg.listen),
        ))
    })
}

/// Accept connections until `shutdown` fires.
pub async fn serve(listener: TcpListener, app: AppState, shutdown: CancellationToken) -> Result<()> {
    let tracker = TaskTracker::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let id = app.registry().next_id();
                        let span = tracing::info_span!("session", conn = %id, %peer);
                        let app = app.clone();
                        let cancel = shutdown.child_token();
                        tracker.spawn(
                            async move {
                                let outcome = run_session(app, id, peer, stream, cancel).await;
                                tracing::debug!(?outcome, "session closed");
                            }
                            .instrument(span),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        }
    }

    tracker.close();
    let drain_ms = app.cfg().shutdown.drain_timeout_ms;
    tracing::info!(sessions = tracker.len(), drain_ms, "shutting down");
    if drain_ms > 0
        && tokio::time::timeout(Duration::from_millis(drain_ms), tracker.wait())
            .await
            .is_err()
    {
        tracing::warn!(remaining = tracker.len(), "drain timeout elapsed");
    }
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting shutdown");
}
