//! Device assembly.
//!
//! One explicitly constructed root object owns every mailbox and worker;
//! there are no process-wide singletons. Drivers come in through
//! [`Drivers`], so tests assemble the same device on simulated hardware.

use crate::actuator::ActuatorActor;
use crate::api::{self, ApiContext};
use crate::coordinator::Coordinator;
use crate::display::DisplayActor;
use crate::indicator::IndicatorActor;
use crate::network::NetworkActor;
use crate::storage::StorageActor;
use device_actors::{mailbox, spawn, Mailbox, DEFAULT_MAILBOX_CAPACITY};
use device_config::SavedSettings;
use device_hal::{Button, IndicatorBank, Panel, PulseDriver, Radio, StorageMedium};
use device_types::{
    ActuatorMessage, CoordinatorMessage, DeviceInfo, DisplayMessage, IndicatorMessage,
    NetworkMessage, StatusSnapshot, StorageMessage,
};
use paneld_web::{RouteTable, SocketHandler, WebMessage, WebServer};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// The hardware the device is built on.
pub struct Drivers {
    pub storage: Box<dyn StorageMedium>,
    pub radio: Box<dyn Radio>,
    pub panel: Box<dyn Panel>,
    pub pulse: Box<dyn PulseDriver>,
    pub indicators: Box<dyn IndicatorBank>,
    pub button: Box<dyn Button>,
}

#[derive(Debug, Clone)]
pub struct DeviceOptions {
    /// Port the web server binds on the acquired address.
    pub http_port: u16,
    pub info: DeviceInfo,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            http_port: 80,
            info: DeviceInfo::simulated(),
        }
    }
}

/// The running device: every actor's mailbox plus the shared state the
/// web surface reads.
pub struct Device {
    pub coordinator: Mailbox<CoordinatorMessage>,
    pub storage: Mailbox<StorageMessage>,
    pub network: Mailbox<NetworkMessage>,
    pub display: Mailbox<DisplayMessage>,
    pub actuator: Mailbox<ActuatorMessage>,
    pub indicators: Mailbox<IndicatorMessage>,
    pub web: Mailbox<WebMessage>,
    pub snapshot: StatusSnapshot,
    pub settings: SavedSettings,
    /// Address of the bound web listener, while one exists.
    pub web_address: Arc<RwLock<Option<SocketAddr>>>,
    workers: Vec<JoinHandle<()>>,
    // The button driver only feeds its press hook; keep it alive here.
    _button: Box<dyn Button>,
}

impl Device {
    /// Wire every actor and start the workers.
    pub fn assemble(options: DeviceOptions, mut drivers: Drivers) -> Self {
        let snapshot = StatusSnapshot::new();
        let settings = SavedSettings::new();

        let (coordinator_tx, coordinator_rx) =
            mailbox::<CoordinatorMessage>("coordinator", DEFAULT_MAILBOX_CAPACITY);
        let (storage_tx, storage_rx) = mailbox("storage", DEFAULT_MAILBOX_CAPACITY);
        let (network_tx, network_rx) = mailbox("network", DEFAULT_MAILBOX_CAPACITY);
        let (display_tx, display_rx) = mailbox("display", DEFAULT_MAILBOX_CAPACITY);
        let (actuator_tx, actuator_rx) = mailbox("actuator", DEFAULT_MAILBOX_CAPACITY);
        let (indicator_tx, indicator_rx) = mailbox("indicator", DEFAULT_MAILBOX_CAPACITY);
        let (web_tx, web_rx) = mailbox("web", DEFAULT_MAILBOX_CAPACITY);

        // Button presses go straight into the coordinator's mailbox.
        {
            let coordinator = coordinator_tx.clone();
            drivers.button.set_press_hook(Box::new(move || {
                coordinator.post(CoordinatorMessage::ButtonPressed);
            }));
        }

        let routes = Arc::new(RwLock::new(RouteTable::new()));
        api::register_routes(
            &mut routes.write(),
            Arc::new(ApiContext {
                info: options.info.clone(),
                snapshot: snapshot.clone(),
                settings: settings.clone(),
                indicators: indicator_tx.clone(),
                actuator: actuator_tx.clone(),
            }),
        );

        // Inbound socket payloads: "status" gets the current snapshot,
        // anything else is consumed without a reply.
        let socket_handler: SocketHandler = {
            let snapshot = snapshot.clone();
            Arc::new(move |payload| {
                if payload.trim() == "status" {
                    serde_json::to_string(&snapshot.load()).ok()
                } else {
                    None
                }
            })
        };

        let web_server = WebServer::new(Arc::clone(&routes), socket_handler, web_tx.clone());
        let web_address = web_server.bound_address();

        let coordinator = Coordinator::new(
            display_tx.clone(),
            network_tx.clone(),
            web_tx.clone(),
            indicator_tx.clone(),
            coordinator_tx.clone(),
            snapshot.clone(),
            settings.clone(),
            options.http_port,
        );

        let workers = vec![
            spawn(coordinator, coordinator_rx),
            spawn(
                StorageActor::new(drivers.storage, coordinator_tx.clone(), storage_tx.clone()),
                storage_rx,
            ),
            spawn(
                NetworkActor::new(drivers.radio, coordinator_tx.clone(), network_tx.clone()),
                network_rx,
            ),
            spawn(
                DisplayActor::new(drivers.panel, coordinator_tx.clone()),
                display_rx,
            ),
            spawn(ActuatorActor::new(drivers.pulse), actuator_rx),
            spawn(
                IndicatorActor::new(drivers.indicators, snapshot.clone()),
                indicator_rx,
            ),
            spawn(web_server, web_rx),
        ];
        info!(workers = workers.len(), "device assembled");

        Self {
            coordinator: coordinator_tx,
            storage: storage_tx,
            network: network_tx,
            display: display_tx,
            actuator: actuator_tx,
            indicators: indicator_tx,
            web: web_tx,
            snapshot,
            settings,
            web_address,
            workers,
            _button: drivers.button,
        }
    }

    /// Cooperative shutdown: every worker gets its quit message and flushes
    /// its teardown (unmount, stop serving, leave the network).
    pub async fn shutdown(self) {
        info!("shutting down device");
        let _ = self.storage.send(StorageMessage::Quit).await;
        let _ = self.web.send(WebMessage::Quit).await;
        let _ = self.network.send(NetworkMessage::Quit).await;
        let _ = self.display.send(DisplayMessage::Quit).await;
        let _ = self.actuator.send(ActuatorMessage::Quit).await;
        let _ = self.indicators.send(IndicatorMessage::Quit).await;
        let _ = self.coordinator.send(CoordinatorMessage::Quit).await;
        for worker in self.workers {
            let _ = worker.await;
        }
        info!("device stopped");
    }
}
