//! Broadcast engine: fan one record out to every registered peer but its sender.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use chatrelay_core::error::{ChatError, Result};
use chatrelay_core::Record;

use crate::realtime::registry::Registry;
use crate::realtime::types::{ConnId, PreparedRecord};

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Broadcaster {
    registry: Arc<Registry>,
    write_timeout: Option<Duration>,
}

impl Broadcaster {
    /// `write_timeout` bounds each recipient's write; `None` waits on the transport.
    pub fn new(registry: Arc<Registry>, write_timeout: Option<Duration>) -> Self {
        Self {
            registry,
            write_timeout,
        }
    }

    /// Deliver `record` to every handle except `sender`.
    ///
    /// A failed or timed-out write is logged and skipped. The failed recipient
    /// stays registered (only its own session removes it) but its writer is
    /// marked broken, so later fan-outs skip it instead of appending to a
    /// torn record. The only error
    /// returned is an encode failure, before anything is written.
    pub async fn broadcast(&self, record: &Record, sender: ConnId) -> Result<Delivery> {
        let prepared = PreparedRecord::encode(record)?;
        let write_timeout = self.write_timeout;

        let results = self
            .registry
            .for_each_except(sender, move |handle| {
                let prepared = prepared.clone();
                Box::pin(async move {
                    let res = match write_timeout {
                        Some(t) => match timeout(t, handle.write_prepared(&prepared)).await {
                            Ok(res) => res,
                            Err(_) => {
                                handle.mark_broken();
                                Err(ChatError::Timeout)
                            }
                        },
                        None => handle.write_prepared(&prepared).await,
                    };
                    if let Err(ChatError::WriterBroken) = &res {
                        tracing::debug!(to = %handle.id(), "skipping broken writer");
                    } else if let Err(e) = &res {
                        tracing::warn!(
                            to = %handle.id(),
                            peer = %handle.peer(),
                            kind = %prepared.kind(),
                            code = e.code(),
                            error = %e,
                            "broadcast delivery failed"
                        );
                    }
                    res.is_ok()
                })
            })
            .await;

        let delivered = results.iter().filter(|(_, ok)| *ok).count();
        let delivery = Delivery {
            delivered,
            failed: results.len() - delivered,
        };
        tracing::debug!(
            from = %sender,
            kind = %record.kind(),
            delivered = delivery.delivered,
            failed = delivery.failed,
            "broadcast"
        );
        Ok(delivery)
    }
}
