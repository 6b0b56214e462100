//! Coordinator state machine.
//!
//! The only component that observes every peripheral and decides
//! cross-resource transitions: storage mounted → network connect → web
//! server start → display timeout. It is the sole writer of its state
//! flags; everything else reads them through the status snapshot.
//!
//! Within a handler, display refresh commands are enqueued before the
//! dependent action commands, so the panel may show a transient
//! intermediate state ("Wi-Fi connecting") while the action is still in
//! flight. Transitions are sequences of independent asynchronous commands,
//! not atomic batches.

use async_trait::async_trait;
use device_actors::{Actor, Flow, Mailbox};
use device_config::{DeviceConfig, SavedSettings};
use device_types::{
    CoordinatorMessage, DisplayMessage, IndicatorMessage, NetworkMessage, StatusSnapshot,
};
use paneld_web::WebMessage;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long the display stays awake after connecting or a button press.
pub const AWAKE_WINDOW: Duration = Duration::from_secs(30);

pub struct Coordinator {
    display: Mailbox<DisplayMessage>,
    network: Mailbox<NetworkMessage>,
    web: Mailbox<WebMessage>,
    indicators: Mailbox<IndicatorMessage>,
    self_mailbox: Mailbox<CoordinatorMessage>,
    snapshot: StatusSnapshot,
    settings: SavedSettings,
    http_port: u16,

    mounted: bool,
    mount_root: Option<PathBuf>,
    connected: bool,
    address: Option<Ipv4Addr>,
    awake: bool,
    /// Bumped on every timer arm; stale expiries carry an older value.
    awake_epoch: u64,
    config: DeviceConfig,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        display: Mailbox<DisplayMessage>,
        network: Mailbox<NetworkMessage>,
        web: Mailbox<WebMessage>,
        indicators: Mailbox<IndicatorMessage>,
        self_mailbox: Mailbox<CoordinatorMessage>,
        snapshot: StatusSnapshot,
        settings: SavedSettings,
        http_port: u16,
    ) -> Self {
        Self {
            display,
            network,
            web,
            indicators,
            self_mailbox,
            snapshot,
            settings,
            http_port,
            mounted: false,
            mount_root: None,
            connected: false,
            address: None,
            awake: false,
            awake_epoch: 0,
            config: DeviceConfig::default(),
        }
    }

    /// URL the panel advertises while awake.
    fn device_url(&self, address: Ipv4Addr) -> String {
        if self.http_port == 80 {
            format!("http://{address}/")
        } else {
            format!("http://{}:{}/", address, self.http_port)
        }
    }

    /// Push the current state to the panel and the status lamp.
    async fn refresh_display(&self) -> anyhow::Result<()> {
        if self.connected {
            match (self.awake, self.address) {
                (true, Some(address)) => {
                    let url = self.device_url(address);
                    self.display.send(DisplayMessage::ShowQr(url)).await?;
                }
                _ => self.display.send(DisplayMessage::Clear).await?,
            }
            self.indicators
                .send(IndicatorMessage::SetStatus(false))
                .await?;
        } else if self.mounted {
            self.display
                .send(DisplayMessage::ShowText("Wi-Fi connecting".to_string()))
                .await?;
            self.indicators
                .send(IndicatorMessage::SetStatus(true))
                .await?;
        } else {
            self.display
                .send(DisplayMessage::ShowText("No storage".to_string()))
                .await?;
            self.indicators
                .send(IndicatorMessage::SetStatus(false))
                .await?;
        }
        Ok(())
    }

    fn arm_awake_timer(&mut self) {
        self.awake_epoch = self.awake_epoch.wrapping_add(1);
        let epoch = self.awake_epoch;
        let mailbox = self.self_mailbox.clone();
        tokio::spawn(async move {
            tokio::time::sleep(AWAKE_WINDOW).await;
            // Timer context: non-blocking post only.
            mailbox.post(CoordinatorMessage::AwakeExpired(epoch));
        });
    }

    /// Queue a status payload for connected WebSocket clients and drain.
    async fn push_status(&self) -> anyhow::Result<()> {
        let status = self.snapshot.load();
        let payload = serde_json::json!({
            "storage_mounted": status.storage_mounted,
            "network_connected": status.network_connected,
            "ip_address": status.ip_string(),
        })
        .to_string();
        self.web.send(WebMessage::Broadcast(payload)).await?;
        self.web.send(WebMessage::FlushBroadcasts).await?;
        Ok(())
    }

    async fn on_mount_changed(&mut self, root: Option<PathBuf>) -> anyhow::Result<()> {
        self.mounted = root.is_some();
        self.mount_root = root.clone();
        self.snapshot.update(|s| s.storage_mounted = self.mounted);

        match root {
            Some(root) => {
                self.refresh_display().await?;

                self.config = match DeviceConfig::load(&root) {
                    Ok(config) => config,
                    Err(e) => {
                        warn!(error = %e, "no usable device configuration on medium");
                        DeviceConfig::default()
                    }
                };
                self.settings.attach(&root);

                if self.config.has_network_credentials() {
                    let ssid = self.config.ssid().unwrap_or_default().to_string();
                    let passphrase = self.config.passphrase().unwrap_or_default().to_string();
                    self.network
                        .send(NetworkMessage::Connect { ssid, passphrase })
                        .await?;
                } else {
                    info!("configuration lacks network credentials, staying offline");
                    self.network.send(NetworkMessage::Disconnect).await?;
                }
            }
            None => {
                self.refresh_display().await?;
                self.web.send(WebMessage::Stop).await?;
                self.network.send(NetworkMessage::Disconnect).await?;
            }
        }
        self.push_status().await
    }

    async fn on_network_up(&mut self, address: Ipv4Addr) -> anyhow::Result<()> {
        info!(address = %address, "network up");
        self.connected = true;
        self.address = Some(address);
        self.awake = true;
        self.snapshot.update(|s| {
            s.network_connected = true;
            s.ip_address = Some(address);
            s.display_awake = true;
        });
        self.arm_awake_timer();
        self.refresh_display().await?;

        // Replace any previous server instance with one bound to the new
        // address and the mounted document root.
        self.web.send(WebMessage::Stop).await?;
        match &self.mount_root {
            Some(root) => {
                self.web
                    .send(WebMessage::Start {
                        bind: SocketAddr::from((address, self.http_port)),
                        doc_root: root.clone(),
                    })
                    .await?;
            }
            None => warn!("network up without mounted storage, web server not started"),
        }
        self.push_status().await
    }

    async fn on_network_down(&mut self) -> anyhow::Result<()> {
        info!("network down");
        self.connected = false;
        self.address = None;
        self.awake = false;
        self.snapshot.update(|s| {
            s.network_connected = false;
            s.ip_address = None;
            s.display_awake = false;
        });
        self.refresh_display().await?;
        self.push_status().await
    }

    async fn on_button_pressed(&mut self) -> anyhow::Result<()> {
        debug!("button pressed, reopening awake window");
        self.awake = true;
        self.snapshot.update(|s| s.display_awake = true);
        self.arm_awake_timer();
        self.refresh_display().await
    }

    async fn on_awake_expired(&mut self, epoch: u64) -> anyhow::Result<()> {
        if epoch != self.awake_epoch {
            // A later button press re-armed the window.
            debug!(epoch, current = self.awake_epoch, "stale awake expiry");
            return Ok(());
        }
        if !self.awake {
            return Ok(());
        }
        debug!("awake window elapsed, blanking display");
        self.awake = false;
        self.snapshot.update(|s| s.display_awake = false);
        self.refresh_display().await
    }
}

#[async_trait]
impl Actor for Coordinator {
    type Message = CoordinatorMessage;

    fn name(&self) -> &'static str {
        "coordinator"
    }

    async fn handle(&mut self, msg: CoordinatorMessage) -> anyhow::Result<Flow> {
        match msg {
            CoordinatorMessage::UpdateDisplay => self.refresh_display().await?,
            CoordinatorMessage::MountChanged { root } => self.on_mount_changed(root).await?,
            CoordinatorMessage::NetworkUp(address) => self.on_network_up(address).await?,
            CoordinatorMessage::NetworkDown => self.on_network_down().await?,
            CoordinatorMessage::ButtonPressed => self.on_button_pressed().await?,
            CoordinatorMessage::AwakeExpired(epoch) => self.on_awake_expired(epoch).await?,
            CoordinatorMessage::Quit => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }
}
