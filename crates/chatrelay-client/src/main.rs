//! chatrelay console client.
//!
//! Connects to the relay, asks for a display name on stdin, prints every
//! record the relay sends, and sends each further stdin line as a message.
//! Usage: `chatrelay-client [host:port]` (or `$CHATRELAY_ADDR`).

use std::process::ExitCode;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatrelay_core::error::Result;
use chatrelay_core::{JsonRecordCodec, RecordKind, WireRecord};

const DEFAULT_ADDR: &str = "localhost:8080";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let addr = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CHATRELAY_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    match run(&addr).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(%addr, code = e.code(), error = %e, "chatrelay-client failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(addr: &str) -> Result<()> {
    let stream = TcpStream::connect(addr).await?;
    let (reader, writer) = stream.into_split();
    let mut inbound = FramedRead::new(reader, JsonRecordCodec::<WireRecord>::default());
    let mut outbound = FramedWrite::new(writer, JsonRecordCodec::<WireRecord>::default());

    let printer = tokio::spawn(async move {
        while let Some(next) = inbound.next().await {
            match next {
                Ok(rec) => {
                    if let Some(line) = render(&rec) {
                        println!("{line}");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "bad record from relay");
                    break;
                }
            }
        }
        tracing::info!("relay closed the connection");
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Enter your username: ").await?;
    stdout.flush().await?;

    let Some(name) = lines.next_line().await? else {
        return Ok(());
    };
    let username = name.trim().to_string();
    outbound.send(outgoing(RecordKind::RequestUsername, &username, "")).await?;

    while let Some(line) = lines.next_line().await? {
        if printer.is_finished() {
            break;
        }
        outbound.send(outgoing(RecordKind::Message, &username, &line)).await?;
    }
    Ok(())
}

fn outgoing(kind: RecordKind, username: &str, message: &str) -> WireRecord {
    WireRecord {
        kind: kind.as_str().to_string(),
        username: username.to_string(),
        message: message.to_string(),
    }
}

/// Console line for an inbound record, `None` for records with nothing to show.
fn render(rec: &WireRecord) -> Option<String> {
    match RecordKind::parse(&rec.kind) {
        Some(RecordKind::Message) => Some(format!("{}: {}", rec.username, rec.message)),
        Some(RecordKind::UserJoined) => Some(format!("* {} joined", rec.username)),
        Some(RecordKind::UserLeft) => Some(format!("* {} left", rec.username)),
        Some(RecordKind::RequestUsername) => None,
        None => {
            tracing::debug!(kind = %rec.kind, "ignoring unknown record type");
            None
        }
    }
}
