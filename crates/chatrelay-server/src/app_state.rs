//! Shared application state for the relay.
//!
//! Built once at startup and cloned into every session task. The registry is
//! owned here and handed out explicitly; nothing lives in module-level statics.

use std::sync::Arc;
use std::time::Duration;

use crate::config::RelayConfig;
use crate::realtime::{Broadcaster, Registry};

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<RelayConfig>,
    registry: Arc<Registry>,
    broadcaster: Arc<Broadcaster>,
}

impl AppState {
    pub fn new(cfg: RelayConfig) -> Self {
        let registry = Arc::new(Registry::new());
        let write_timeout = match cfg.broadcast.write_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&registry), write_timeout));

        Self {
            cfg: Arc::new(cfg),
            registry,
            broadcaster,
        }
    }

    pub fn cfg(&self) -> &RelayConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }
}
