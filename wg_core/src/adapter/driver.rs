//! The driver capability consumed by the lifecycle controller.
//!
//! On Windows this is backed by the function table resolved from
//! `wireguard.dll`; tests bind it to an in-memory fake. Either way the
//! controller only sees this trait.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

/// Result type for driver calls.
pub type DriverResult<T> = Result<T, DriverError>;

/// A failing call into the driver, carrying the platform status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("driver returned status 0x{status:08X}")]
pub struct DriverError {
    /// Platform status code (HRESULT-style)
    pub status: i32,
}

impl DriverError {
    pub fn new(status: i32) -> Self {
        DriverError { status }
    }
}

/// Operational state of a live adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    /// Adapter exists but is not passing traffic
    Down,
    /// Adapter is up and passing traffic
    Up,
}

/// Opaque reference to a live adapter.
///
/// Deliberately neither `Clone` nor `Copy`: the handle is owned by
/// exactly one [`TunnelManager`](crate::adapter::TunnelManager) and is
/// consumed by [`AdapterDriver::close_adapter`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AdapterHandle(u64);

impl AdapterHandle {
    /// Wrap a raw driver token. Only driver implementations should
    /// mint handles.
    pub fn from_raw(raw: u64) -> Self {
        AdapterHandle(raw)
    }

    /// The raw driver token.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The privileged adapter driver surface.
///
/// Every call is synchronous and blocking; the controller never issues
/// overlapping calls. The configuration blob's length travels with the
/// slice.
pub trait AdapterDriver: Send {
    /// Create a new virtual adapter.
    fn create_adapter(
        &self,
        name: &str,
        tunnel_type: &str,
        request_id: Uuid,
    ) -> DriverResult<AdapterHandle>;

    /// Apply a configuration blob to an adapter.
    fn set_configuration(&self, adapter: &AdapterHandle, config: &[u8]) -> DriverResult<()>;

    /// Transition an adapter up or down.
    fn set_adapter_state(&self, adapter: &AdapterHandle, state: AdapterState) -> DriverResult<()>;

    /// Query the current adapter state.
    fn adapter_state(&self, adapter: &AdapterHandle) -> DriverResult<AdapterState>;

    /// Close an adapter, consuming the handle.
    fn close_adapter(&self, adapter: AdapterHandle);
}

// Lets tests (and embedders) keep their own reference to the driver
// while the manager owns a boxed one.
impl<D: AdapterDriver + Sync> AdapterDriver for Arc<D> {
    fn create_adapter(
        &self,
        name: &str,
        tunnel_type: &str,
        request_id: Uuid,
    ) -> DriverResult<AdapterHandle> {
        (**self).create_adapter(name, tunnel_type, request_id)
    }

    fn set_configuration(&self, adapter: &AdapterHandle, config: &[u8]) -> DriverResult<()> {
        (**self).set_configuration(adapter, config)
    }

    fn set_adapter_state(&self, adapter: &AdapterHandle, state: AdapterState) -> DriverResult<()> {
        (**self).set_adapter_state(adapter, state)
    }

    fn adapter_state(&self, adapter: &AdapterHandle) -> DriverResult<AdapterState> {
        (**self).adapter_state(adapter)
    }

    fn close_adapter(&self, adapter: AdapterHandle) {
        (**self).close_adapter(adapter)
    }
}
