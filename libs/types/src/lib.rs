//! Shared types for paneld
//!
//! Leaf crate holding the actor message enums, the cross-worker status
//! snapshot, and the device identity record. Depended on by every service
//! crate; depends on nothing in the workspace.

pub mod device;
pub mod messages;
pub mod status;

pub use device::DeviceInfo;
pub use messages::{
    ActuatorMessage, CoordinatorMessage, DisplayMessage, IndicatorMessage, NetworkMessage,
    StorageMessage,
};
pub use status::{DeviceStatus, StatusSnapshot};
