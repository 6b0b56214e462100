//! Read-only device configuration.

use crate::{kv, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// File name under the mount root.
pub const CONFIG_FILE: &str = "config";

const KEY_SSID: &str = "ssid";
const KEY_PASSPHRASE: &str = "pass";

/// The `config` file on the mounted medium. Loaded once per mount event;
/// never written by the device.
#[derive(Debug, Clone, Default)]
pub struct DeviceConfig {
    values: BTreeMap<String, String>,
}

impl DeviceConfig {
    /// Load from `<root>/config`. A missing or unreadable file yields an
    /// error; the caller decides whether to proceed without one.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let file = File::open(&path)?;
        let values = kv::parse(BufReader::new(file))?;
        for (key, value) in &values {
            debug!(key = %key, value = %value, "config entry");
        }
        info!(path = %path.display(), entries = values.len(), "device configuration loaded");
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Network name, when configured.
    pub fn ssid(&self) -> Option<&str> {
        self.get(KEY_SSID)
    }

    /// Network credential, when configured.
    pub fn passphrase(&self) -> Option<&str> {
        self.get(KEY_PASSPHRASE)
    }

    /// Both keys a connect attempt requires are present.
    pub fn has_network_credentials(&self) -> bool {
        self.ssid().is_some() && self.passphrase().is_some()
    }
}
