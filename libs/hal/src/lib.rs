//! Peripheral Seams
//!
//! Trait boundaries for the hardware this device coordinates. The raw
//! protocols behind them (storage bus, panel pixel pushing, radio
//! association, pulse duty calculation) are out of scope; each actor owns
//! exactly one trait object and is the only code that mutates it.
//!
//! Hooks registered on a driver fire from interrupt/callback context: an
//! implementation must treat them as non-blocking notification paths only
//! (the actors pass closures that do a non-blocking mailbox post).
//!
//! [`sim`] provides in-process implementations, each paired with a control
//! handle, used by the binary and the test suites.

pub mod sim;
pub mod traits;

use thiserror::Error;

pub use traits::{
    Button, EdgeHook, IndicatorBank, LinkEvent, LinkHook, Panel, PulseDriver, Radio, StorageMedium,
};

#[derive(Debug, Error)]
pub enum HalError {
    /// The peripheral never initialized; fatal for its lifetime.
    #[error("peripheral '{0}' is not initialized")]
    NotInitialized(&'static str),

    #[error("no medium is mounted")]
    NotMounted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, HalError>;
