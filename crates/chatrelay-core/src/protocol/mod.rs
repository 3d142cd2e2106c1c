//! Wire protocol: JSON message records.
//!
//! Every record on the stream is a self-delimited JSON object with the fields
//! `type`, `username`, and `message`. Framing is handled by the transport codec.

pub mod record;

pub use record::{Record, RecordKind, WireRecord};
