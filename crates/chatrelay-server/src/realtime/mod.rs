//! Realtime runtime: connection handles, the registry, and the broadcast engine.

pub mod broadcast;
pub mod handle;
pub mod registry;
pub mod types;

pub use broadcast::{Broadcaster, Delivery};
pub use handle::{BoxedWriter, Handle};
pub use registry::Registry;
pub use types::{ConnId, PreparedRecord};
