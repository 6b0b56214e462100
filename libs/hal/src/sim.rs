//! Simulated drivers.
//!
//! Each simulator comes as a `(driver, control)` pair sharing state: the
//! driver half is handed to its owning actor, the control half stays with
//! the binary or the test to inject edges and inspect what the actor did.

use crate::traits::*;
use crate::{HalError, Result};
use parking_lot::Mutex;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

type SharedHook = Arc<dyn Fn() + Send + Sync>;
type SharedLinkHook = Arc<dyn Fn(LinkEvent) + Send + Sync>;

// ---------------------------------------------------------------------------
// Storage

struct StorageState {
    level: bool,
    mounted: bool,
    hook: Option<SharedHook>,
    mounts: u32,
    unmounts: u32,
}

/// Storage medium backed by a directory on the host.
pub struct SimStorage {
    root: PathBuf,
    state: Arc<Mutex<StorageState>>,
}

#[derive(Clone)]
pub struct SimStorageControl {
    state: Arc<Mutex<StorageState>>,
}

impl SimStorage {
    pub fn new(root: PathBuf) -> (Self, SimStorageControl) {
        let state = Arc::new(Mutex::new(StorageState {
            level: false,
            mounted: false,
            hook: None,
            mounts: 0,
            unmounts: 0,
        }));
        (
            Self {
                root,
                state: Arc::clone(&state),
            },
            SimStorageControl { state },
        )
    }
}

impl SimStorageControl {
    /// Set the presence level and fire the edge hook, like a card moving
    /// in or out of the slot.
    pub fn set_level(&self, present: bool) {
        let hook = {
            let mut state = self.state.lock();
            state.level = present;
            state.hook.clone()
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    pub fn mount_count(&self) -> u32 {
        self.state.lock().mounts
    }

    pub fn unmount_count(&self) -> u32 {
        self.state.lock().unmounts
    }
}

impl StorageMedium for SimStorage {
    fn present(&self) -> bool {
        self.state.lock().level
    }

    fn set_presence_hook(&mut self, hook: EdgeHook) {
        self.state.lock().hook = Some(Arc::from(hook));
    }

    fn mount(&mut self) -> Result<PathBuf> {
        let mut state = self.state.lock();
        if !state.level {
            return Err(HalError::Device("no medium in slot".to_string()));
        }
        state.mounted = true;
        state.mounts += 1;
        info!(root = %self.root.display(), "simulated medium mounted");
        Ok(self.root.clone())
    }

    fn unmount(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.mounted {
            state.mounted = false;
            state.unmounts += 1;
            info!("simulated medium unmounted");
        }
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        self.state.lock().mounted
    }
}

// ---------------------------------------------------------------------------
// Radio

struct RadioState {
    associated: bool,
    hook: Option<SharedLinkHook>,
    join_requests: Vec<(String, String)>,
    leave_requests: u32,
    auto_join: bool,
}

/// Station-mode radio granting a fixed address.
pub struct SimRadio {
    address: Ipv4Addr,
    state: Arc<Mutex<RadioState>>,
}

#[derive(Clone)]
pub struct SimRadioControl {
    state: Arc<Mutex<RadioState>>,
}

impl SimRadio {
    /// With `auto_join`, every join request completes immediately through
    /// the link hook; otherwise the control decides when (and whether)
    /// association completes.
    pub fn new(address: Ipv4Addr, auto_join: bool) -> (Self, SimRadioControl) {
        let state = Arc::new(Mutex::new(RadioState {
            associated: false,
            hook: None,
            join_requests: Vec::new(),
            leave_requests: 0,
            auto_join,
        }));
        (
            Self {
                address,
                state: Arc::clone(&state),
            },
            SimRadioControl { state },
        )
    }
}

impl SimRadioControl {
    /// Complete the pending association, as the stack's event callback
    /// would.
    pub fn complete_join(&self) {
        let hook = {
            let mut state = self.state.lock();
            state.associated = true;
            state.hook.clone()
        };
        if let Some(hook) = hook {
            hook(LinkEvent::Joined);
        }
    }

    /// Drop the association, as a lost-beacon event would.
    pub fn drop_link(&self) {
        let hook = {
            let mut state = self.state.lock();
            state.associated = false;
            state.hook.clone()
        };
        if let Some(hook) = hook {
            hook(LinkEvent::Lost);
        }
    }

    pub fn join_requests(&self) -> Vec<(String, String)> {
        self.state.lock().join_requests.clone()
    }

    pub fn leave_requests(&self) -> u32 {
        self.state.lock().leave_requests
    }
}

impl Radio for SimRadio {
    fn set_link_hook(&mut self, hook: LinkHook) {
        self.state.lock().hook = Some(Arc::from(hook));
    }

    fn request_join(&mut self, ssid: &str, passphrase: &str) -> Result<()> {
        let (hook, auto) = {
            let mut state = self.state.lock();
            state
                .join_requests
                .push((ssid.to_string(), passphrase.to_string()));
            (state.hook.clone(), state.auto_join)
        };
        info!(ssid = %ssid, "simulated join requested");
        if auto {
            self.state.lock().associated = true;
            if let Some(hook) = hook {
                hook(LinkEvent::Joined);
            }
        }
        Ok(())
    }

    fn request_leave(&mut self) -> Result<()> {
        let hook = {
            let mut state = self.state.lock();
            state.leave_requests += 1;
            if !state.associated {
                return Ok(());
            }
            state.associated = false;
            state.hook.clone()
        };
        if let Some(hook) = hook {
            hook(LinkEvent::Lost);
        }
        Ok(())
    }

    fn is_associated(&self) -> bool {
        self.state.lock().associated
    }

    fn address(&self) -> Option<Ipv4Addr> {
        self.state.lock().associated.then_some(self.address)
    }
}

// ---------------------------------------------------------------------------
// Panel

/// What the panel last rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelFrame {
    Text(String),
    Qr(String),
    Cleared,
}

struct PanelState {
    ready: bool,
    frames: Vec<PanelFrame>,
}

pub struct SimPanel {
    state: Arc<Mutex<PanelState>>,
}

#[derive(Clone)]
pub struct SimPanelControl {
    state: Arc<Mutex<PanelState>>,
}

impl SimPanel {
    pub fn new() -> (Self, SimPanelControl) {
        Self::with_ready(true)
    }

    /// A panel whose initialization failed; every draw is refused.
    pub fn uninitialized() -> (Self, SimPanelControl) {
        Self::with_ready(false)
    }

    fn with_ready(ready: bool) -> (Self, SimPanelControl) {
        let state = Arc::new(Mutex::new(PanelState {
            ready,
            frames: Vec::new(),
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimPanelControl { state },
        )
    }
}

impl SimPanelControl {
    pub fn frames(&self) -> Vec<PanelFrame> {
        self.state.lock().frames.clone()
    }

    pub fn last_frame(&self) -> Option<PanelFrame> {
        self.state.lock().frames.last().cloned()
    }
}

impl SimPanel {
    fn push(&self, frame: PanelFrame) -> Result<()> {
        let mut state = self.state.lock();
        if !state.ready {
            return Err(HalError::NotInitialized("panel"));
        }
        info!(frame = ?frame, "panel");
        state.frames.push(frame);
        Ok(())
    }
}

impl Panel for SimPanel {
    fn ready(&self) -> bool {
        self.state.lock().ready
    }

    fn show_text(&mut self, text: &str) -> Result<()> {
        self.push(PanelFrame::Text(text.to_string()))
    }

    fn show_qr(&mut self, url: &str) -> Result<()> {
        self.push(PanelFrame::Qr(url.to_string()))
    }

    fn clear(&mut self) -> Result<()> {
        self.push(PanelFrame::Cleared)
    }
}

// ---------------------------------------------------------------------------
// Pulse actuator

struct PulseState {
    ready: bool,
    angles: Vec<f64>,
}

pub struct SimPulse {
    state: Arc<Mutex<PulseState>>,
}

#[derive(Clone)]
pub struct SimPulseControl {
    state: Arc<Mutex<PulseState>>,
}

impl SimPulse {
    pub fn new() -> (Self, SimPulseControl) {
        let state = Arc::new(Mutex::new(PulseState {
            ready: true,
            angles: Vec::new(),
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimPulseControl { state },
        )
    }
}

impl SimPulseControl {
    pub fn angles(&self) -> Vec<f64> {
        self.state.lock().angles.clone()
    }
}

impl PulseDriver for SimPulse {
    fn ready(&self) -> bool {
        self.state.lock().ready
    }

    fn set_angle(&mut self, degrees: f64) -> Result<()> {
        let mut state = self.state.lock();
        if !state.ready {
            return Err(HalError::NotInitialized("pulse"));
        }
        state.angles.push(degrees);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Indicators

struct IndicatorState {
    bank: [bool; 4],
    status: bool,
}

pub struct SimIndicators {
    state: Arc<Mutex<IndicatorState>>,
}

#[derive(Clone)]
pub struct SimIndicatorsControl {
    state: Arc<Mutex<IndicatorState>>,
}

impl SimIndicators {
    pub fn new() -> (Self, SimIndicatorsControl) {
        let state = Arc::new(Mutex::new(IndicatorState {
            bank: [false; 4],
            status: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimIndicatorsControl { state },
        )
    }
}

impl SimIndicatorsControl {
    pub fn bank(&self) -> [bool; 4] {
        self.state.lock().bank
    }

    pub fn status(&self) -> bool {
        self.state.lock().status
    }
}

impl IndicatorBank for SimIndicators {
    fn set_bank(&mut self, states: [bool; 4]) -> Result<()> {
        self.state.lock().bank = states;
        Ok(())
    }

    fn set_status(&mut self, on: bool) -> Result<()> {
        self.state.lock().status = on;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Button

struct ButtonState {
    hook: Option<SharedHook>,
}

pub struct SimButton {
    state: Arc<Mutex<ButtonState>>,
}

#[derive(Clone)]
pub struct SimButtonControl {
    state: Arc<Mutex<ButtonState>>,
}

impl SimButton {
    pub fn new() -> (Self, SimButtonControl) {
        let state = Arc::new(Mutex::new(ButtonState { hook: None }));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimButtonControl { state },
        )
    }
}

impl SimButtonControl {
    pub fn press(&self) {
        let hook = self.state.lock().hook.clone();
        if let Some(hook) = hook {
            hook();
        }
    }
}

impl Button for SimButton {
    fn set_press_hook(&mut self, hook: EdgeHook) {
        self.state.lock().hook = Some(Arc::from(hook));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_edges_fire_hook_and_mount_requires_presence() {
        let (mut storage, control) = SimStorage::new(PathBuf::from("/tmp/sim"));
        let edges = Arc::new(Mutex::new(0u32));
        let seen = Arc::clone(&edges);
        storage.set_presence_hook(Box::new(move || *seen.lock() += 1));

        assert!(storage.mount().is_err());

        control.set_level(true);
        control.set_level(false);
        assert_eq!(*edges.lock(), 2);

        control.set_level(true);
        let root = storage.mount().unwrap();
        assert_eq!(root, PathBuf::from("/tmp/sim"));
        assert!(storage.is_mounted());
        assert_eq!(control.mount_count(), 1);
    }

    #[test]
    fn radio_auto_join_reports_through_hook() {
        let (mut radio, control) = SimRadio::new(Ipv4Addr::new(127, 0, 0, 1), true);
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&events);
        radio.set_link_hook(Box::new(move |e| seen.lock().push(e)));

        assert_eq!(radio.address(), None);
        radio.request_join("Home", "secret1").unwrap();
        assert!(radio.is_associated());
        assert_eq!(radio.address(), Some(Ipv4Addr::new(127, 0, 0, 1)));
        assert_eq!(events.lock().as_slice(), &[LinkEvent::Joined]);
        assert_eq!(control.join_requests(), vec![("Home".to_string(), "secret1".to_string())]);
    }

    #[test]
    fn uninitialized_panel_refuses_draws() {
        let (mut panel, control) = SimPanel::uninitialized();
        assert!(!panel.ready());
        assert!(panel.show_text("x").is_err());
        assert!(control.frames().is_empty());
    }
}
