//! Display actor.
//!
//! Serializes draw commands onto the panel driver. Once the panel reports
//! ready, the coordinator is asked for the first refresh; a panel that
//! never initialized stays dark for the session and every draw is skipped.

use async_trait::async_trait;
use device_actors::{Actor, Flow, Mailbox};
use device_hal::Panel;
use device_types::{CoordinatorMessage, DisplayMessage};
use tracing::{error, warn};

pub struct DisplayActor {
    panel: Box<dyn Panel>,
    coordinator: Mailbox<CoordinatorMessage>,
}

impl DisplayActor {
    pub fn new(panel: Box<dyn Panel>, coordinator: Mailbox<CoordinatorMessage>) -> Self {
        Self { panel, coordinator }
    }
}

#[async_trait]
impl Actor for DisplayActor {
    type Message = DisplayMessage;

    fn name(&self) -> &'static str {
        "display"
    }

    async fn on_start(&mut self) -> anyhow::Result<()> {
        if self.panel.ready() {
            self.coordinator
                .send(CoordinatorMessage::UpdateDisplay)
                .await?;
        } else {
            error!("display panel failed to initialize");
        }
        Ok(())
    }

    async fn handle(&mut self, msg: DisplayMessage) -> anyhow::Result<Flow> {
        let result = match msg {
            DisplayMessage::Quit => return Ok(Flow::Stop),
            _ if !self.panel.ready() => {
                warn!("panel not initialized, ignoring draw command");
                return Ok(Flow::Continue);
            }
            DisplayMessage::ShowText(text) => self.panel.show_text(&text),
            DisplayMessage::ShowQr(url) => self.panel.show_qr(&url),
            DisplayMessage::Clear => self.panel.clear(),
        };
        if let Err(e) = result {
            error!(error = %e, "panel draw failed");
        }
        Ok(Flow::Continue)
    }
}
