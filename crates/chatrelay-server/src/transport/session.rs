//! Per-connection session loop.
//!
//! Lifecycle: Connected -> AwaitingUsername -> Active -> Closed.
//! - Connected: the handle is registered before the name is known.
//! - AwaitingUsername: send `request_username`, then take the `username` of
//!   the first record the peer sends, whatever its `type`.
//! - Active: announce `user_joined`, then relay each inbound record's
//!   `message` under the registered name. The peer's own `type`/`username`
//!   fields are ignored.
//! - Closed: EOF or a decode error announces `user_left`; shutdown does not.
//!   The handle is removed and its writer shut down on every exit path.

use std::net::SocketAddr;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use chatrelay_core::error::ChatError;
use chatrelay_core::{JsonRecordCodec, Record, WireRecord};

use crate::app_state::AppState;
use crate::realtime::{ConnId, Handle};

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Peer left or failed before completing registration. Nothing announced.
    NeverRegistered,
    /// Peer disconnected or sent garbage after registering. `user_left` announced.
    Disconnected { username: String },
    /// Shutdown observed. Nothing announced.
    Shutdown { username: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingUsername,
    Active,
}

enum Next {
    Record(WireRecord),
    Eof,
    Failed(ChatError),
    Cancelled,
}

type Frames<R> = FramedRead<R, JsonRecordCodec<WireRecord>>;

pub async fn run_session<S>(
    app: AppState,
    id: ConnId,
    peer: SocketAddr,
    stream: S,
    cancel: CancellationToken,
) -> SessionOutcome
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let codec = JsonRecordCodec::new(app.cfg().server.max_record_bytes);
    let mut frames = FramedRead::new(reader, codec);

    app.registry().add(Handle::new(id, peer, writer)).await;
    tracing::debug!("connected");

    let outcome = drive(&app, id, &mut frames, &cancel).await;

    if let Some(mut handle) = app.registry().remove(id).await {
        handle.close().await;
    }
    outcome
}

async fn drive<R>(
    app: &AppState,
    id: ConnId,
    frames: &mut Frames<R>,
    cancel: &CancellationToken,
) -> SessionOutcome
where
    R: AsyncRead + Unpin,
{
    let interrupt = app.cfg().session.interrupt_reads_on_shutdown;

    if let Err(e) = app.registry().send_to(id, &Record::RequestUsername).await {
        tracing::debug!(error = %e, "request_username not delivered");
        return SessionOutcome::NeverRegistered;
    }

    let mut phase = Phase::AwaitingUsername;
    let username = match next_record(frames, cancel, interrupt).await {
        Next::Record(rec) => rec.username,
        Next::Eof => {
            tracing::debug!(?phase, "peer left before registering");
            return SessionOutcome::NeverRegistered;
        }
        Next::Failed(e) => {
            tracing::info!(?phase, code = e.code(), error = %e, "registration failed");
            return SessionOutcome::NeverRegistered;
        }
        Next::Cancelled => return SessionOutcome::Shutdown { username: None },
    };

    if let Err(e) = app.registry().set_username(id, &username).await {
        tracing::warn!(error = %e, "handle vanished during registration");
        return SessionOutcome::NeverRegistered;
    }
    phase = Phase::Active;
    tracing::info!(%username, "user joined");
    announce(app, id, Record::user_joined(username.as_str())).await;

    loop {
        match next_record(frames, cancel, interrupt).await {
            Next::Record(rec) => {
                announce(app, id, Record::message(username.as_str(), rec.message)).await;
                if cancel.is_cancelled() {
                    tracing::debug!(?phase, "shutdown observed");
                    return SessionOutcome::Shutdown {
                        username: Some(username),
                    };
                }
            }
            Next::Eof => {
                tracing::info!(%username, "user left");
                announce(app, id, Record::user_left(username.as_str())).await;
                return SessionOutcome::Disconnected { username };
            }
            Next::Failed(e) => {
                tracing::info!(%username, code = e.code(), error = %e, "user dropped");
                announce(app, id, Record::user_left(username.as_str())).await;
                return SessionOutcome::Disconnected { username };
            }
            Next::Cancelled => {
                tracing::debug!(?phase, "read interrupted by shutdown");
                return SessionOutcome::Shutdown {
                    username: Some(username),
                };
            }
        }
    }
}

async fn next_record<R>(frames: &mut Frames<R>, cancel: &CancellationToken, interrupt: bool) -> Next
where
    R: AsyncRead + Unpin,
{
    let item = if interrupt {
        tokio::select! {
            _ = cancel.cancelled() => return Next::Cancelled,
            item = frames.next() => item,
        }
    } else {
        frames.next().await
    };

    match item {
        Some(Ok(rec)) => Next::Record(rec),
        Some(Err(e)) => Next::Failed(e),
        None => Next::Eof,
    }
}

async fn announce(app: &AppState, id: ConnId, record: Record) {
    if let Err(e) = app.broadcaster().broadcast(&record, id).await {
        tracing::warn!(kind = %record.kind(), error = %e, "broadcast failed");
    }
}
