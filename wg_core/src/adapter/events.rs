//! Events emitted to the embedding shell.
//!
//! The controller fires status, log and progress notifications inline
//! during its operations. Shells subscribe through [`EventSink`]; a
//! standard-library mpsc sender works out of the box.

use std::fmt;
use std::sync::mpsc::Sender;

/// Externally visible tunnel status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelStatus {
    /// No adapter exists
    Inactive,
    /// Adapter created and configured, not yet started
    Ready,
    /// Adapter is up
    Connected,
    /// Adapter is down
    Disconnected,
    /// Driver reported a state this core does not know
    Unknown,
    /// The state query itself failed
    QueryFailed,
}

impl fmt::Display for TunnelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TunnelStatus::Inactive => "Inactive",
            TunnelStatus::Ready => "Ready",
            TunnelStatus::Connected => "Connected",
            TunnelStatus::Disconnected => "Disconnected",
            TunnelStatus::Unknown => "Unknown",
            TunnelStatus::QueryFailed => "Error querying state",
        };
        f.write_str(s)
    }
}

/// A notification from the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelEvent {
    /// The tunnel status changed
    StatusChanged(TunnelStatus),
    /// A human-readable log line
    Log(String),
    /// Coarse progress, 0..=100
    Progress(u8),
}

/// Receives controller events.
///
/// Delivery is best-effort; a sink that can no longer accept events
/// (e.g. a dropped receiver) is silently skipped.
pub trait EventSink: Send {
    fn emit(&self, event: TunnelEvent);
}

impl EventSink for Sender<TunnelEvent> {
    fn emit(&self, event: TunnelEvent) {
        let _ = self.send(event);
    }
}
