use serde::Deserialize;
use chatrelay_core::error::{ChatError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub broadcast: BroadcastSection,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub shutdown: ShutdownSection,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            broadcast: BroadcastSection::default(),
            session: SessionSection::default(),
            shutdown: ShutdownSection::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatError::UnsupportedVersion);
        }
        self.server.validate()?;
        self.broadcast.validate()?;
        self.shutdown.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Upper bound for one inbound record, in bytes.
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_record_bytes: default_max_record_bytes(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.trim().is_empty() {
            return Err(ChatError::Config("server.listen must not be empty".into()));
        }
        if !(256..=16 * 1024 * 1024).contains(&self.max_record_bytes) {
            return Err(ChatError::Config(
                "server.max_record_bytes must be between 256 and 16777216".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastSection {
    /// Per-recipient write timeout; 0 waits on the transport indefinitely.
    #[serde(default)]
    pub write_timeout_ms: u64,
}

impl BroadcastSection {
    pub fn validate(&self) -> Result<()> {
        if self.write_timeout_ms > 60_000 {
            return Err(ChatError::Config(
                "broadcast.write_timeout_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    /// Race blocked reads against shutdown instead of polling between records.
    #[serde(default)]
    pub interrupt_reads_on_shutdown: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShutdownSection {
    /// How long to wait for sessions after the signal; 0 exits without waiting.
    #[serde(default)]
    pub drain_timeout_ms: u64,
}

impl ShutdownSection {
    pub fn validate(&self) -> Result<()> {
        if self.drain_timeout_ms > 600_000 {
            return Err(ChatError::Config(
                "shutdown.drain_timeout_ms must be at most 600000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "localhost:8080".into()
}
fn default_max_record_bytes() -> usize {
    64 * 1024
}
