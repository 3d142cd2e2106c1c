//! Relay config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chatrelay_core::error::{ChatError, Result};

pub use schema::{BroadcastSection, RelayConfig, ServerSection, SessionSection, ShutdownSection};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CHATRELAY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "chatrelay.yaml";

pub fn load_from_file(path: impl AsRef<Path>) -> Result<RelayConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| ChatError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RelayConfig> {
    let cfg: RelayConfig =
        serde_yaml::from_str(s).map_err(|e| ChatError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load from `$CHATRELAY_CONFIG` (or `chatrelay.yaml`). A missing file falls
/// back to built-in defaults; an unreadable or invalid one is an error.
pub fn load() -> Result<RelayConfig> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    match fs::metadata(&path) {
        Ok(_) => load_from_file(&path),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found, using defaults");
            Ok(RelayConfig::default())
        }
        Err(e) => Err(ChatError::Config(format!("stat {path} failed: {e}"))),
    }
}
