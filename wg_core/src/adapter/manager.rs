//! Adapter lifecycle controller.
//!
//! Owns at most one adapter handle and sequences it through
//! create → configure → up/down → close. Driver failures are logged,
//! reported through the event sinks and returned to the caller; they
//! never retry and never leave a half-configured adapter behind.

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapter::driver::{AdapterDriver, AdapterHandle, AdapterState};
use crate::adapter::error::{AdapterError, AdapterResult};
use crate::adapter::events::{EventSink, TunnelEvent, TunnelStatus};

/// Adapter type tag passed to the driver on create.
pub const TUNNEL_TYPE: &str = "WireGuard";

/// Controller for a single tunnel adapter.
pub struct TunnelManager {
    driver: Box<dyn AdapterDriver>,
    adapter: Option<AdapterHandle>,
    tunnel_name: Option<String>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl TunnelManager {
    /// Create a controller bound to a driver capability.
    pub fn new(driver: Box<dyn AdapterDriver>) -> Self {
        TunnelManager {
            driver,
            adapter: None,
            tunnel_name: None,
            sinks: Vec::new(),
        }
    }

    /// Subscribe a sink to status/log/progress events.
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Name of the current tunnel, if an adapter exists.
    pub fn tunnel_name(&self) -> Option<&str> {
        self.tunnel_name.as_deref()
    }

    /// Whether an adapter handle is currently held.
    pub fn has_adapter(&self) -> bool {
        self.adapter.is_some()
    }

    /// Create and configure a new adapter.
    ///
    /// Any existing adapter is closed first, so at most one handle is
    /// ever live. If applying the configuration fails, the just-created
    /// adapter is closed again and the controller returns to the
    /// no-adapter state.
    pub fn create_tunnel(&mut self, name: &str, config: &[u8]) -> AdapterResult<()> {
        self.cleanup();

        let request_id = Uuid::new_v4();
        let handle = match self.driver.create_adapter(name, TUNNEL_TYPE, request_id) {
            Ok(handle) => handle,
            Err(e) => {
                error!(name, status = e.status, "failed to create adapter");
                self.log(format!("Failed to create adapter '{name}': status 0x{:08X}", e.status));
                return Err(AdapterError::Driver(e));
            }
        };

        if let Err(e) = self.driver.set_configuration(&handle, config) {
            error!(name, status = e.status, "failed to apply configuration");
            self.log("Failed to apply configuration.".to_string());
            // Roll back so no unconfigured adapter is left behind
            self.driver.close_adapter(handle);
            return Err(AdapterError::Driver(e));
        }

        self.adapter = Some(handle);
        self.tunnel_name = Some(name.to_string());
        self.emit(TunnelEvent::StatusChanged(TunnelStatus::Ready));
        info!(name, blob_len = config.len(), "tunnel created and configured");
        self.log(format!("Tunnel '{name}' created and configured."));
        Ok(())
    }

    /// Bring the adapter up.
    pub fn start_tunnel(&mut self) -> AdapterResult<()> {
        let Some(adapter) = self.adapter.as_ref() else {
            warn!("start requested with no adapter");
            self.log("No adapter created.".to_string());
            return Err(AdapterError::NoAdapter);
        };

        match self.driver.set_adapter_state(adapter, AdapterState::Up) {
            Ok(()) => {
                self.emit(TunnelEvent::Progress(100));
                self.emit(TunnelEvent::StatusChanged(TunnelStatus::Connected));
                info!(name = self.tunnel_name.as_deref(), "tunnel started");
                self.log("Tunnel started.".to_string());
                Ok(())
            }
            Err(e) => {
                self.emit(TunnelEvent::Progress(0));
                error!(status = e.status, "failed to start tunnel");
                self.log(format!("Failed to start tunnel: status 0x{:08X}", e.status));
                Err(AdapterError::Driver(e))
            }
        }
    }

    /// Take the adapter down.
    ///
    /// With no adapter present this is an idempotent no-op success.
    pub fn stop_tunnel(&mut self) -> AdapterResult<()> {
        let Some(adapter) = self.adapter.as_ref() else {
            return Ok(()); // already stopped
        };

        match self.driver.set_adapter_state(adapter, AdapterState::Down) {
            Ok(()) => {
                self.emit(TunnelEvent::StatusChanged(TunnelStatus::Disconnected));
                info!(name = self.tunnel_name.as_deref(), "tunnel stopped");
                self.log("Tunnel stopped.".to_string());
                Ok(())
            }
            Err(e) => {
                error!(status = e.status, "failed to stop tunnel");
                self.log(format!("Failed to stop tunnel: status 0x{:08X}", e.status));
                Err(AdapterError::Driver(e))
            }
        }
    }

    /// Query the current status. Purely observational.
    pub fn status(&self) -> TunnelStatus {
        let Some(adapter) = self.adapter.as_ref() else {
            return TunnelStatus::Inactive;
        };
        match self.driver.adapter_state(adapter) {
            Ok(AdapterState::Down) => TunnelStatus::Disconnected,
            Ok(AdapterState::Up) => TunnelStatus::Connected,
            Err(e) => {
                warn!(status = e.status, "adapter state query failed");
                TunnelStatus::QueryFailed
            }
        }
    }

    /// Close the adapter if one is held. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        if let Some(handle) = self.adapter.take() {
            info!(name = self.tunnel_name.as_deref(), "closing adapter");
            self.driver.close_adapter(handle);
            self.tunnel_name = None;
        }
    }

    fn emit(&self, event: TunnelEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }

    fn log(&self, message: String) {
        self.emit(TunnelEvent::Log(message));
    }
}

impl Drop for TunnelManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}
