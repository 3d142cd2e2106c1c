//! Transport layer (TCP).
//!
//! Exposes the per-connection session loop. Record framing lives in
//! `chatrelay_core::codec`.

pub mod session;

pub use session::{run_session, SessionOutcome};
