use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::BoxFuture;
use tokio::sync::Mutex;

use chatrelay_core::error::{ChatError, Result};
use chatrelay_core::Record;

use crate::realtime::handle::Handle;
use crate::realtime::types::ConnId;

/// Connection registry: `ConnId -> Handle` behind one exclusive lock.
///
/// Every membership change and every fan-out takes the same lock, so all of
/// them happen in a single total order. `for_each_except` keeps the lock for
/// the whole iteration: a handle is never visited after its removal returned,
/// and two fan-outs never interleave. A slow recipient delays everyone.
pub struct Registry {
    conns: Mutex<HashMap<ConnId, Handle>>,
    seq: AtomicU64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            conns: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh connection id.
    pub fn next_id(&self) -> ConnId {
        ConnId(self.seq.fetch_add(1, Ordering::Relaxed))
    }

    /// Insert a handle. An existing entry with the same id is replaced;
    /// callers allocate ids with `next_id` so this does not happen.
    pub async fn add(&self, handle: Handle) {
        let mut conns = self.conns.lock().await;
        if let Some(old) = conns.insert(handle.id(), handle) {
            tracing::warn!(conn = %old.id(), "registry entry replaced");
        }
    }

    /// Remove a handle. Idempotent: absent ids are a no-op.
    pub async fn remove(&self, id: ConnId) -> Option<Handle> {
        self.conns.lock().await.remove(&id)
    }

    pub async fn contains(&self, id: ConnId) -> bool {
        self.conns.lock().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.conns.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conns.lock().await.is_empty()
    }

    /// Registered display names, sorted. Unregistered handles are skipped.
    pub async fn usernames(&self) -> Vec<String> {
        let conns = self.conns.lock().await;
        let mut names: Vec<String> = conns
            .values()
            .filter_map(|h| h.username().map(str::to_string))
            .collect();
        names.sort();
        names
    }

    pub async fn set_username(&self, id: ConnId, name: &str) -> Result<bool> {
        let mut conns = self.conns.lock().await;
        let handle = conns.get_mut(&id).ok_or(ChatError::NotConnected)?;
        Ok(handle.set_username(name))
    }

    /// Write one record to a single handle.
    pub async fn send_to(&self, id: ConnId, record: &Record) -> Result<()> {
        let mut conns = self.conns.lock().await;
        let handle = conns.get_mut(&id).ok_or(ChatError::NotConnected)?;
        handle.send(record).await
    }

    /// Run `f` on every handle except `sender`, holding the lock throughout.
    /// Returns each visited id with the value its future produced.
    pub async fn for_each_except<F, R>(&self, sender: ConnId, mut f: F) -> Vec<(ConnId, R)>
    where
        F: for<'a> FnMut(&'a mut Handle) -> BoxFuture<'a, R>,
    {
        let mut conns = self.conns.lock().await;
        let mut out = Vec::with_capacity(conns.len());
        for (id, handle) in conns.iter_mut() {
            if *id == sender {
                continue;
            }
            out.push((*id, f(handle).await));
        }
        out
    }
}
