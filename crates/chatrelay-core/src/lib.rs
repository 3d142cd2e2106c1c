//! chatrelay core: message records, their stream codec, and the shared error type.
//!
//! This crate defines the wire-level contract shared by the relay server and
//! the console client. The `codec` feature (on by default) adds the tokio-util
//! framing; without it the crate is plain serde types.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed input
//! must surface as `ChatError`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

#[cfg(feature = "codec")]
pub mod codec;
pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ChatError, Result};
pub use protocol::{Record, RecordKind, WireRecord};

#[cfg(feature = "codec")]
pub use codec::JsonRecordCodec;
