//! Adapter lifecycle control.
//!
//! The platform driver is modeled as the [`AdapterDriver`] capability
//! trait; [`TunnelManager`] owns at most one adapter handle at a time
//! and sequences create, configure, up/down and close against it,
//! reporting status, log and progress events to subscribed sinks.

pub mod driver;
pub mod error;
pub mod events;
pub mod manager;

pub use driver::{AdapterDriver, AdapterHandle, AdapterState, DriverError, DriverResult};
pub use error::{AdapterError, AdapterResult};
pub use events::{EventSink, TunnelEvent, TunnelStatus};
pub use manager::{TunnelManager, TUNNEL_TYPE};
