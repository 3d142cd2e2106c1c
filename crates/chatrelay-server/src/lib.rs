//! chatrelay server library.
//!
//! Wires the TCP transport, the connection registry, and the broadcast engine
//! into a relay. Consumed by the `chatrelay-server` binary, the console
//! client (for the record codec), and integration tests.

pub mod app_state;
pub mod config;
pub mod realtime;
pub mod supervisor;
pub mod transport;

pub use app_state::AppState;
