//! Storage-Backed Configuration
//!
//! Two independent `key=value` text stores live on the mounted medium:
//!
//! - [`DeviceConfig`] — read-only at runtime, reloaded on every mount;
//!   carries the network name and credential.
//! - [`SavedSettings`] — mutable, persisted on request through the
//!   `/API/save` operation.
//!
//! Both share the line codec in [`kv`].

pub mod device;
pub mod kv;
pub mod settings;

use thiserror::Error;

pub use device::DeviceConfig;
pub use settings::SavedSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings store is not attached to a mounted medium")]
    NotAttached,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
