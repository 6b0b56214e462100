//! Cross-worker status snapshot.
//!
//! Coordinator flags are written only by the coordinator worker, the lamp
//! bank only by the indicator worker. Non-owning tasks (the web handlers)
//! read a coherent copy through [`StatusSnapshot::load`] instead of
//! touching another worker's fields.

use parking_lot::RwLock;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Point-in-time device state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceStatus {
    pub storage_mounted: bool,
    pub network_connected: bool,
    /// The 30-second display window is open.
    pub display_awake: bool,
    pub ip_address: Option<Ipv4Addr>,
    pub led: [bool; 4],
}

impl DeviceStatus {
    /// Address formatted for API responses; empty while offline.
    pub fn ip_string(&self) -> String {
        self.ip_address.map(|a| a.to_string()).unwrap_or_default()
    }
}

/// Shared handle to the snapshot. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    inner: Arc<RwLock<DeviceStatus>>,
}

impl StatusSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out the current state.
    pub fn load(&self) -> DeviceStatus {
        self.inner.read().clone()
    }

    /// Mutate the snapshot. Called only by the worker owning the fields
    /// being written.
    pub fn update(&self, f: impl FnOnce(&mut DeviceStatus)) {
        let mut guard = self.inner.write();
        f(&mut guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_visible_to_load() {
        let snapshot = StatusSnapshot::new();
        assert!(!snapshot.load().storage_mounted);

        snapshot.update(|s| {
            s.storage_mounted = true;
            s.ip_address = Some(Ipv4Addr::new(192, 168, 0, 7));
        });

        let status = snapshot.load();
        assert!(status.storage_mounted);
        assert_eq!(status.ip_string(), "192.168.0.7");
    }

    #[test]
    fn clones_share_state() {
        let a = StatusSnapshot::new();
        let b = a.clone();
        a.update(|s| s.led = [true, false, true, false]);
        assert_eq!(b.load().led, [true, false, true, false]);
    }
}
