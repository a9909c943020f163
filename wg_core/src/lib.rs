//! Core engine for driving a WireGuard-style VPN adapter.
//!
//! This crate turns a human-authored tunnel definition file into the
//! binary configuration blob consumed by the platform adapter driver,
//! and sequences the adapter through its create / configure / up / down
//! lifecycle. The driver itself is an external capability injected as a
//! trait object; a GUI or CLI shell observes the controller through an
//! event sink.

pub mod adapter;
pub mod conf;
pub mod logging;
pub mod wire;

// Re-export the types most embedders need
pub use adapter::{
    AdapterDriver, AdapterError, AdapterHandle, AdapterState, DriverError, EventSink, TunnelEvent,
    TunnelManager, TunnelStatus,
};
pub use conf::{ConfigError, IpCidr, PeerConfig, TunnelConfig};
pub use wire::{WireError, HEADER_SIZE, PEER_RECORD_SIZE};
