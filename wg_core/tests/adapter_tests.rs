use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use uuid::Uuid;
use wg_core::adapter::{
    AdapterDriver, AdapterHandle, AdapterState, DriverError, DriverResult, TunnelEvent,
    TunnelManager, TunnelStatus,
};

/// In-memory driver fake: records every call in order, tracks live
/// handles, and fails on demand with scripted status codes.
#[derive(Default)]
struct FakeDriver {
    next_handle: AtomicU64,
    open: Mutex<Vec<u64>>,
    states: Mutex<HashMap<u64, AdapterState>>,
    calls: Mutex<Vec<String>>,
    fail_create: Mutex<Option<i32>>,
    fail_configure: Mutex<Option<i32>>,
    fail_set_state: Mutex<Option<i32>>,
    fail_query: Mutex<Option<i32>>,
}

impl FakeDriver {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn open_handles(&self) -> Vec<u64> {
        self.open.lock().unwrap().clone()
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AdapterDriver for FakeDriver {
    fn create_adapter(
        &self,
        name: &str,
        tunnel_type: &str,
        _request_id: Uuid,
    ) -> DriverResult<AdapterHandle> {
        assert_eq!(tunnel_type, "WireGuard");
        if let Some(status) = *self.fail_create.lock().unwrap() {
            self.record(format!("create({name}) -> fail"));
            return Err(DriverError::new(status));
        }
        let raw = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        self.open.lock().unwrap().push(raw);
        self.states.lock().unwrap().insert(raw, AdapterState::Down);
        self.record(format!("create({name}) -> {raw}"));
        Ok(AdapterHandle::from_raw(raw))
    }

    fn set_configuration(&self, adapter: &AdapterHandle, config: &[u8]) -> DriverResult<()> {
        if let Some(status) = *self.fail_configure.lock().unwrap() {
            self.record(format!("configure({}) -> fail", adapter.raw()));
            return Err(DriverError::new(status));
        }
        self.record(format!("configure({}, {} bytes)", adapter.raw(), config.len()));
        Ok(())
    }

    fn set_adapter_state(&self, adapter: &AdapterHandle, state: AdapterState) -> DriverResult<()> {
        if let Some(status) = *self.fail_set_state.lock().unwrap() {
            self.record(format!("set_state({}) -> fail", adapter.raw()));
            return Err(DriverError::new(status));
        }
        self.states.lock().unwrap().insert(adapter.raw(), state);
        self.record(format!("set_state({}, {state:?})", adapter.raw()));
        Ok(())
    }

    fn adapter_state(&self, adapter: &AdapterHandle) -> DriverResult<AdapterState> {
        if let Some(status) = *self.fail_query.lock().unwrap() {
            return Err(DriverError::new(status));
        }
        Ok(*self
            .states
            .lock()
            .unwrap()
            .get(&adapter.raw())
            .unwrap_or(&AdapterState::Down))
    }

    fn close_adapter(&self, adapter: AdapterHandle) {
        self.open.lock().unwrap().retain(|&h| h != adapter.raw());
        self.record(format!("close({})", adapter.raw()));
    }
}

fn manager_with_events(
    driver: &Arc<FakeDriver>,
) -> (TunnelManager, mpsc::Receiver<TunnelEvent>) {
    let mut manager = TunnelManager::new(Box::new(Arc::clone(driver)));
    let (tx, rx) = mpsc::channel();
    manager.subscribe(Box::new(tx));
    (manager, rx)
}

fn statuses(rx: &mpsc::Receiver<TunnelEvent>) -> Vec<TunnelStatus> {
    rx.try_iter()
        .filter_map(|e| match e {
            TunnelEvent::StatusChanged(s) => Some(s),
            _ => None,
        })
        .collect()
}

fn progress_values(events: &[TunnelEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            TunnelEvent::Progress(v) => Some(*v),
            _ => None,
        })
        .collect()
}

fn blob() -> Vec<u8> {
    vec![0xAB; 188]
}

#[test]
fn test_create_success_reports_ready() {
    let driver = Arc::new(FakeDriver::default());
    let (mut manager, rx) = manager_with_events(&driver);

    manager.create_tunnel("office", &blob()).unwrap();

    assert!(manager.has_adapter());
    assert_eq!(manager.tunnel_name(), Some("office"));
    assert_eq!(driver.open_handles().len(), 1);
    assert_eq!(statuses(&rx), vec![TunnelStatus::Ready]);
    // Created adapters start in the down state
    assert_eq!(manager.status(), TunnelStatus::Disconnected);
}

#[test]
fn test_create_failure_leaves_no_adapter() {
    let driver = Arc::new(FakeDriver::default());
    *driver.fail_create.lock().unwrap() = Some(0x80004005u32 as i32);
    let (mut manager, rx) = manager_with_events(&driver);

    assert!(manager.create_tunnel("office", &blob()).is_err());
    assert!(!manager.has_adapter());
    assert!(driver.open_handles().is_empty());
    assert_eq!(manager.status(), TunnelStatus::Inactive);
    assert!(statuses(&rx).is_empty());
}

#[test]
fn test_configure_failure_rolls_back_created_adapter() {
    let driver = Arc::new(FakeDriver::default());
    *driver.fail_configure.lock().unwrap() = Some(-1);
    let (mut manager, _rx) = manager_with_events(&driver);

    assert!(manager.create_tunnel("office", &blob()).is_err());

    // The adapter created before the configuration failure is closed
    assert!(!manager.has_adapter());
    assert!(driver.open_handles().is_empty());
    assert_eq!(manager.status(), TunnelStatus::Inactive);
    let calls = driver.calls();
    assert_eq!(calls.last().unwrap(), "close(1)");
}

#[test]
fn test_start_stop_cycle_tracks_status() {
    let driver = Arc::new(FakeDriver::default());
    let (mut manager, rx) = manager_with_events(&driver);

    manager.create_tunnel("office", &blob()).unwrap();
    let _ = statuses(&rx);

    manager.start_tunnel().unwrap();
    assert_eq!(manager.status(), TunnelStatus::Connected);
    let events: Vec<_> = rx.try_iter().collect();
    assert!(events.contains(&TunnelEvent::StatusChanged(TunnelStatus::Connected)));
    assert_eq!(progress_values(&events), vec![100]);

    manager.stop_tunnel().unwrap();
    assert_eq!(manager.status(), TunnelStatus::Disconnected);
    assert_eq!(statuses(&rx), vec![TunnelStatus::Disconnected]);
}

#[test]
fn test_start_without_adapter_fails() {
    let driver = Arc::new(FakeDriver::default());
    let (mut manager, rx) = manager_with_events(&driver);

    assert!(manager.start_tunnel().is_err());
    assert!(driver.calls().is_empty());
    let events: Vec<_> = rx.try_iter().collect();
    assert!(events.contains(&TunnelEvent::Log("No adapter created.".to_string())));
}

#[test]
fn test_start_failure_emits_zero_progress_and_keeps_state() {
    let driver = Arc::new(FakeDriver::default());
    let (mut manager, rx) = manager_with_events(&driver);

    manager.create_tunnel("office", &blob()).unwrap();
    let _ = statuses(&rx);

    *driver.fail_set_state.lock().unwrap() = Some(-1);
    assert!(manager.start_tunnel().is_err());
    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(progress_values(&events), vec![0]);
    // Failure leaves the machine in its prior state
    assert_eq!(manager.status(), TunnelStatus::Disconnected);

    // Retrying after the driver recovers works
    *driver.fail_set_state.lock().unwrap() = None;
    manager.start_tunnel().unwrap();
    assert_eq!(manager.status(), TunnelStatus::Connected);
}

#[test]
fn test_stop_is_idempotent() {
    let driver = Arc::new(FakeDriver::default());
    let (mut manager, _rx) = manager_with_events(&driver);

    // Never created: still success, and the driver is never touched
    manager.stop_tunnel().unwrap();
    manager.stop_tunnel().unwrap();
    assert!(driver.calls().is_empty());

    manager.create_tunnel("office", &blob()).unwrap();
    manager.start_tunnel().unwrap();
    manager.stop_tunnel().unwrap();
    manager.stop_tunnel().unwrap();
    assert_eq!(manager.status(), TunnelStatus::Disconnected);
}

#[test]
fn test_second_create_closes_first_adapter() {
    let driver = Arc::new(FakeDriver::default());
    let (mut manager, _rx) = manager_with_events(&driver);

    manager.create_tunnel("first", &blob()).unwrap();
    manager.create_tunnel("second", &blob()).unwrap();

    // Exactly one adapter is live afterwards, and the first was closed
    // before the second was created
    assert_eq!(driver.open_handles(), vec![2]);
    let calls = driver.calls();
    let close_pos = calls.iter().position(|c| c == "close(1)").unwrap();
    let create_pos = calls.iter().position(|c| c.starts_with("create(second)")).unwrap();
    assert!(close_pos < create_pos);
    assert_eq!(manager.tunnel_name(), Some("second"));
}

#[test]
fn test_status_query_failure() {
    let driver = Arc::new(FakeDriver::default());
    let (mut manager, _rx) = manager_with_events(&driver);

    manager.create_tunnel("office", &blob()).unwrap();
    *driver.fail_query.lock().unwrap() = Some(-1);
    let status = manager.status();
    assert_eq!(status, TunnelStatus::QueryFailed);
    assert_eq!(status.to_string(), "Error querying state");
}

#[test]
fn test_drop_closes_adapter() {
    let driver = Arc::new(FakeDriver::default());
    let (mut manager, _rx) = manager_with_events(&driver);

    manager.create_tunnel("office", &blob()).unwrap();
    assert_eq!(driver.open_handles().len(), 1);

    drop(manager);
    assert!(driver.open_handles().is_empty());
}

#[test]
fn test_parsed_config_feeds_the_driver() {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use wg_core::{TunnelConfig, HEADER_SIZE, PEER_RECORD_SIZE};

    let text = format!(
        "[Interface]\nPrivateKey = {}\n[Peer]\nPublicKey = {}\nAllowedIPs = 0.0.0.0/0\n",
        URL_SAFE_NO_PAD.encode([0x01; 32]),
        URL_SAFE_NO_PAD.encode([0x02; 32])
    );
    let config = TunnelConfig::parse(&text).unwrap();
    let blob = config.encode().unwrap();

    let driver = Arc::new(FakeDriver::default());
    let (mut manager, _rx) = manager_with_events(&driver);
    manager.create_tunnel("office", &blob).unwrap();

    let expected = format!("configure(1, {} bytes)", HEADER_SIZE + PEER_RECORD_SIZE);
    assert!(driver.calls().contains(&expected));
}
