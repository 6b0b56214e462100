//! Driver trait definitions.

use crate::Result;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Notification hook fired from interrupt context. Must not block.
pub type EdgeHook = Box<dyn Fn() + Send + Sync>;

/// Asynchronous link state change reported by the network stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Association completed and an address was acquired.
    Joined,
    /// Association lost.
    Lost,
}

/// Notification hook fired from the network stack's callback context.
pub type LinkHook = Box<dyn Fn(LinkEvent) + Send + Sync>;

/// A removable storage device with a presence-detect line.
pub trait StorageMedium: Send {
    /// Current electrical level of the presence line.
    fn present(&self) -> bool;

    /// Register the hook fired on every presence edge.
    fn set_presence_hook(&mut self, hook: EdgeHook);

    /// Mount the filesystem; returns the mount root.
    fn mount(&mut self) -> Result<PathBuf>;

    fn unmount(&mut self) -> Result<()>;

    fn is_mounted(&self) -> bool;
}

/// A network radio in station mode.
pub trait Radio: Send {
    /// Register the hook fired on association changes.
    fn set_link_hook(&mut self, hook: LinkHook);

    /// Issue an asynchronous join request; completion arrives through the
    /// link hook.
    fn request_join(&mut self, ssid: &str, passphrase: &str) -> Result<()>;

    fn request_leave(&mut self) -> Result<()>;

    fn is_associated(&self) -> bool;

    /// Address acquired by the current association.
    fn address(&self) -> Option<Ipv4Addr>;
}

/// The small display panel.
pub trait Panel: Send {
    /// Initialization flag; a panel that never came up stays unusable.
    fn ready(&self) -> bool;

    fn show_text(&mut self, text: &str) -> Result<()>;

    /// Render a QR code of the given URL.
    fn show_qr(&mut self, url: &str) -> Result<()>;

    fn clear(&mut self) -> Result<()>;
}

/// The pulse-width actuator.
pub trait PulseDriver: Send {
    fn ready(&self) -> bool;

    /// Drive to an angle in degrees; duty translation happens below this
    /// seam.
    fn set_angle(&mut self, degrees: f64) -> Result<()>;
}

/// The four-lamp bank plus the board status lamp.
pub trait IndicatorBank: Send {
    fn set_bank(&mut self, states: [bool; 4]) -> Result<()>;

    fn set_status(&mut self, on: bool) -> Result<()>;
}

/// The physical button.
pub trait Button: Send {
    /// Register the hook fired on each press.
    fn set_press_hook(&mut self, hook: EdgeHook);
}
