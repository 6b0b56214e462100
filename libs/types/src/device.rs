//! Device identity reported by the status API.

use serde::Serialize;

/// Static facts about the board, filled in by whoever constructs the
/// device (real bring-up code or the simulator).
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    /// Target chip name, e.g. "esp32".
    pub target: String,
    pub cores: u32,
    /// Feature summary, e.g. "WiFi/BT".
    pub chip: String,
    /// Silicon revision, e.g. "v1.1".
    pub revision: String,
    /// Flash size in megabytes.
    pub flash_mb: u32,
}

impl DeviceInfo {
    /// Identity used by the simulated device.
    pub fn simulated() -> Self {
        Self {
            target: "sim".to_string(),
            cores: 2,
            chip: "WiFi/BT".to_string(),
            revision: "v1.1".to_string(),
            flash_mb: 4,
        }
    }
}
