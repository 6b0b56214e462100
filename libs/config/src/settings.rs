//! Mutable saved settings.

use crate::{kv, ConfigError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// File name under the mount root.
pub const SETTINGS_FILE: &str = "save";

struct Inner {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

/// Key/value settings persisted on the mounted medium.
///
/// Shared between the coordinator (which attaches and reloads the store on
/// mount) and the API handlers (which read and mutate entries); the lock
/// keeps cross-worker access coherent. Nothing touches the file except
/// [`attach`](Self::attach) and [`save`](Self::save).
#[derive(Clone)]
pub struct SavedSettings {
    inner: Arc<RwLock<Inner>>,
}

impl Default for SavedSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SavedSettings {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                path: None,
                values: BTreeMap::new(),
            })),
        }
    }

    /// Bind the store to `<root>/save` and load whatever is there.
    /// Previous in-memory values are discarded; a missing file is an empty
    /// store, not an error.
    pub fn attach(&self, root: &Path) {
        let path = root.join(SETTINGS_FILE);
        let values = match File::open(&path) {
            Ok(file) => match kv::parse(BufReader::new(file)) {
                Ok(values) => values,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read saved settings");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        info!(path = %path.display(), entries = values.len(), "saved settings loaded");

        let mut inner = self.inner.write();
        inner.path = Some(path);
        inner.values = values;
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().values.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.inner
            .write()
            .values
            .insert(key.to_string(), value.to_string());
    }

    /// Persist the current entries to the attached file.
    pub fn save(&self) -> Result<()> {
        let inner = self.inner.read();
        let path = inner.path.as_ref().ok_or(ConfigError::NotAttached)?;
        let file = File::create(path)?;
        kv::write(BufWriter::new(file), &inner.values)?;
        info!(path = %path.display(), entries = inner.values.len(), "saved settings persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_save_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SavedSettings::new();
        settings.attach(dir.path());

        settings.set("memo", "hello");
        settings.save().unwrap();

        // A fresh store attached to the same medium sees the saved value.
        let reloaded = SavedSettings::new();
        reloaded.attach(dir.path());
        assert_eq!(reloaded.get("memo").as_deref(), Some("hello"));
    }

    #[test]
    fn attach_discards_previous_values() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let settings = SavedSettings::new();

        settings.attach(dir_a.path());
        settings.set("memo", "stale");
        settings.attach(dir_b.path());
        assert_eq!(settings.get("memo"), None);
    }

    #[test]
    fn save_without_attach_fails() {
        let settings = SavedSettings::new();
        settings.set("memo", "hello");
        assert!(matches!(
            settings.save(),
            Err(ConfigError::NotAttached)
        ));
    }
}
