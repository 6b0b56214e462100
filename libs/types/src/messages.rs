//! Actor message sets.
//!
//! One enum per actor mailbox. Messages are immutable once enqueued; every
//! set carries a `Quit` variant that ends the owning worker cooperatively.
//! (The web server's message set lives in `paneld-web`, next to the session
//! types it references.)

use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Messages consumed by the coordinator.
#[derive(Debug, Clone)]
pub enum CoordinatorMessage {
    /// Re-evaluate device state and push the result to the display.
    UpdateDisplay,
    /// Storage presence settled: `root` is the mount point, `None` when the
    /// medium is gone or failed to mount.
    MountChanged { root: Option<PathBuf> },
    /// The radio associated and acquired an address.
    NetworkUp(Ipv4Addr),
    /// The radio lost its association.
    NetworkDown,
    /// The physical button was pressed (interrupt context).
    ButtonPressed,
    /// The awake window armed with this epoch elapsed.
    AwakeExpired(u64),
    Quit,
}

/// Messages consumed by the storage actor.
#[derive(Debug, Clone, Copy)]
pub enum StorageMessage {
    /// An electrical edge on the presence line (interrupt context).
    PresenceEdge,
    /// Scheduled re-check after the debounce window.
    DebounceTick,
    Quit,
}

/// Messages consumed by the network actor.
#[derive(Debug, Clone)]
pub enum NetworkMessage {
    Connect { ssid: String, passphrase: String },
    Disconnect,
    /// Radio event hook: association completed (callback context).
    LinkJoined,
    /// Radio event hook: association lost (callback context).
    LinkLost,
    Quit,
}

/// Messages consumed by the display actor.
#[derive(Debug, Clone)]
pub enum DisplayMessage {
    ShowText(String),
    /// Render a QR code of the given URL.
    ShowQr(String),
    Clear,
    Quit,
}

/// Messages consumed by the actuator actor.
#[derive(Debug, Clone, Copy)]
pub enum ActuatorMessage {
    /// Target angle in degrees.
    SetAngle(f64),
    /// Calibration offset added to every angle, in degrees.
    SetTrim(f64),
    Quit,
}

/// Messages consumed by the indicator actor.
#[derive(Debug, Clone, Copy)]
pub enum IndicatorMessage {
    /// Drive the four-lamp bank.
    SetBank([bool; 4]),
    /// Drive the board status lamp.
    SetStatus(bool),
    Quit,
}
