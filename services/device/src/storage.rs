//! Storage actor.
//!
//! Owns the removable medium. Presence edges arrive from interrupt context
//! as non-blocking posts; the worker debounces them with a quiet window:
//! each edge schedules a re-check [`DEBOUNCE_WINDOW`] later, and only a
//! check preceded by a full window of electrical quiet reads the level and
//! acts on it. Edges inside the window are thereby coalesced and the
//! action reflects the level at the end of the window.

use async_trait::async_trait;
use device_actors::{Actor, Flow, Mailbox};
use device_hal::StorageMedium;
use device_types::{CoordinatorMessage, StorageMessage};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

pub struct StorageActor {
    medium: Box<dyn StorageMedium>,
    coordinator: Mailbox<CoordinatorMessage>,
    self_mailbox: Mailbox<StorageMessage>,
    accepted_present: bool,
    last_edge: Option<Instant>,
}

impl StorageActor {
    pub fn new(
        medium: Box<dyn StorageMedium>,
        coordinator: Mailbox<CoordinatorMessage>,
        self_mailbox: Mailbox<StorageMessage>,
    ) -> Self {
        Self {
            medium,
            coordinator,
            self_mailbox,
            accepted_present: false,
            last_edge: None,
        }
    }

    fn schedule_recheck(&mut self) {
        self.last_edge = Some(Instant::now());
        let mailbox = self.self_mailbox.clone();
        tokio::spawn(async move {
            tokio::time::sleep(DEBOUNCE_WINDOW).await;
            // Timer context: non-blocking post only.
            mailbox.post(StorageMessage::DebounceTick);
        });
    }

    async fn settle(&mut self) -> anyhow::Result<()> {
        let quiet = self
            .last_edge
            .is_some_and(|edge| edge.elapsed() >= DEBOUNCE_WINDOW);
        if !quiet {
            // A later edge re-armed the window; its own tick is pending.
            return Ok(());
        }

        let present = self.medium.present();
        if present == self.accepted_present {
            return Ok(());
        }
        self.accepted_present = present;

        let root = if present {
            match self.medium.mount() {
                Ok(root) => {
                    info!(root = %root.display(), "storage mounted");
                    Some(root)
                }
                Err(e) => {
                    // Unavailable until the medium is reinserted.
                    error!(error = %e, "failed to mount storage");
                    None
                }
            }
        } else {
            if let Err(e) = self.medium.unmount() {
                warn!(error = %e, "unmount failed");
            }
            info!("storage removed");
            None
        };

        self.coordinator
            .send(CoordinatorMessage::MountChanged { root })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Actor for StorageActor {
    type Message = StorageMessage;

    fn name(&self) -> &'static str {
        "storage"
    }

    async fn on_start(&mut self) -> anyhow::Result<()> {
        let mailbox = self.self_mailbox.clone();
        self.medium.set_presence_hook(Box::new(move || {
            mailbox.post(StorageMessage::PresenceEdge);
        }));
        // Pick up a medium already present at boot.
        self.self_mailbox.post(StorageMessage::PresenceEdge);
        Ok(())
    }

    async fn handle(&mut self, msg: StorageMessage) -> anyhow::Result<Flow> {
        match msg {
            StorageMessage::PresenceEdge => self.schedule_recheck(),
            StorageMessage::DebounceTick => self.settle().await?,
            StorageMessage::Quit => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }

    async fn on_stop(&mut self) {
        if self.medium.is_mounted() {
            if let Err(e) = self.medium.unmount() {
                warn!(error = %e, "unmount on shutdown failed");
            }
        }
    }
}
