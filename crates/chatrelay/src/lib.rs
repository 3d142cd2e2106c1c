//! Top-level facade crate for chatrelay.
//!
//! Re-exports the protocol types and the relay server library so users can depend on a single crate.

pub mod core {
    pub use chatrelay_core::*;
}

pub mod server {
    pub use chatrelay_server::*;
}
