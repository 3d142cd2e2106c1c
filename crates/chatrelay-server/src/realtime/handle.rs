use std::net::SocketAddr;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use chatrelay_core::error::{ChatError, Result};
use chatrelay_core::Record;

use crate::realtime::types::{ConnId, PreparedRecord};

/// Write half of a peer transport.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One connected peer: identity, display name, and the outbound writer.
pub struct Handle {
    id: ConnId,
    peer: SocketAddr,
    username: Option<String>,
    writer: BoxedWriter,
    /// Set once a write fails or is abandoned part-way. The stream may hold a
    /// torn record, so nothing more is written to it.
    broken: bool,
}

impl Handle {
    pub fn new<W>(id: ConnId, peer: SocketAddr, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            id,
            peer,
            username: None,
            writer: Box::new(writer),
            broken: false,
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// `None` until registration completes.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Set the display name. The name is fixed once set; later calls return false.
    pub fn set_username(&mut self, name: impl Into<String>) -> bool {
        if self.username.is_some() {
            return false;
        }
        self.username = Some(name.into());
        true
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Stop writing to this peer. Used when a write future was dropped mid-record.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    pub async fn write_prepared(&mut self, record: &PreparedRecord) -> Result<()> {
        if self.broken {
            return Err(ChatError::WriterBroken);
        }
        let res = async {
            self.writer.write_all(record.as_bytes()).await?;
            self.writer.flush().await
        }
        .await;
        if res.is_err() {
            self.broken = true;
        }
        Ok(res?)
    }

    pub async fn send(&mut self, record: &Record) -> Result<()> {
        let prepared = PreparedRecord::encode(record)?;
        self.write_prepared(&prepared).await
    }

    /// Shut down the write half. Errors are ignored; the peer may already be gone.
    pub async fn close(&mut self) {
        let _ = self.writer.shutdown().await;
    }
}
