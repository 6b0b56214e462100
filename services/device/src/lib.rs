//! paneld Coordination Core
//!
//! One actor per hardware resource, a coordinator that owns every
//! cross-resource decision, and the web surface wired to both. See
//! [`app::Device`] for how the pieces are assembled.
//!
//! ```text
//! edges/callbacks ──post──▶ owning actor ──notify──▶ coordinator
//!                                   ▲                    │
//!                                   └──────commands──────┘
//! ```

pub mod actuator;
pub mod api;
pub mod app;
pub mod coordinator;
pub mod display;
pub mod indicator;
pub mod network;
pub mod storage;

pub use app::{Device, DeviceOptions, Drivers};
