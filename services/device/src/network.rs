//! Network actor.
//!
//! Owns the station-mode radio. Connect/disconnect requests come from the
//! coordinator; association results arrive asynchronously through the
//! radio's event hook, which only posts into this actor's own mailbox.

use async_trait::async_trait;
use device_actors::{Actor, Flow, Mailbox};
use device_hal::{LinkEvent, Radio};
use device_types::{CoordinatorMessage, NetworkMessage};
use tracing::{error, info, warn};

/// Hard protocol limit on the network name, in bytes.
pub const MAX_SSID_BYTES: usize = 32;
/// Hard protocol limit on the credential, in bytes.
pub const MAX_PASSPHRASE_BYTES: usize = 64;

pub struct NetworkActor {
    radio: Box<dyn Radio>,
    coordinator: Mailbox<CoordinatorMessage>,
    self_mailbox: Mailbox<NetworkMessage>,
}

impl NetworkActor {
    pub fn new(
        radio: Box<dyn Radio>,
        coordinator: Mailbox<CoordinatorMessage>,
        self_mailbox: Mailbox<NetworkMessage>,
    ) -> Self {
        Self {
            radio,
            coordinator,
            self_mailbox,
        }
    }

    fn connect(&mut self, ssid: &str, passphrase: &str) {
        if ssid.len() > MAX_SSID_BYTES {
            error!(len = ssid.len(), limit = MAX_SSID_BYTES, "network name over protocol limit");
            return;
        }
        if passphrase.len() > MAX_PASSPHRASE_BYTES {
            error!(
                len = passphrase.len(),
                limit = MAX_PASSPHRASE_BYTES,
                "credential over protocol limit"
            );
            return;
        }
        if self.radio.is_associated() {
            if let Err(e) = self.radio.request_leave() {
                warn!(error = %e, "leave before reconnect failed");
            }
        }
        info!(ssid = %ssid, "requesting association");
        if let Err(e) = self.radio.request_join(ssid, passphrase) {
            // No retry; the next mount event or explicit request re-attempts.
            error!(ssid = %ssid, error = %e, "join request failed");
        }
    }

    fn disconnect(&mut self) {
        if !self.radio.is_associated() {
            return;
        }
        if let Err(e) = self.radio.request_leave() {
            warn!(error = %e, "leave request failed");
        }
    }
}

#[async_trait]
impl Actor for NetworkActor {
    type Message = NetworkMessage;

    fn name(&self) -> &'static str {
        "network"
    }

    async fn on_start(&mut self) -> anyhow::Result<()> {
        let mailbox = self.self_mailbox.clone();
        self.radio.set_link_hook(Box::new(move |event| {
            // Stack callback context: non-blocking post only.
            mailbox.post(match event {
                LinkEvent::Joined => NetworkMessage::LinkJoined,
                LinkEvent::Lost => NetworkMessage::LinkLost,
            });
        }));
        Ok(())
    }

    async fn handle(&mut self, msg: NetworkMessage) -> anyhow::Result<Flow> {
        match msg {
            NetworkMessage::Connect { ssid, passphrase } => self.connect(&ssid, &passphrase),
            NetworkMessage::Disconnect => self.disconnect(),
            NetworkMessage::LinkJoined => match self.radio.address() {
                Some(address) => {
                    info!(address = %address, "network connected");
                    self.coordinator
                        .send(CoordinatorMessage::NetworkUp(address))
                        .await?;
                }
                None => warn!("link joined without an address"),
            },
            NetworkMessage::LinkLost => {
                info!("network disconnected");
                self.coordinator.send(CoordinatorMessage::NetworkDown).await?;
            }
            NetworkMessage::Quit => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }

    async fn on_stop(&mut self) {
        if self.radio.is_associated() {
            let _ = self.radio.request_leave();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_actors::{mailbox, spawn, MailboxReceiver};
    use device_hal::sim::{SimRadio, SimRadioControl};
    use std::net::Ipv4Addr;
    use std::time::Duration;

    struct Fixture {
        control: SimRadioControl,
        network_tx: Mailbox<NetworkMessage>,
        coordinator_rx: MailboxReceiver<CoordinatorMessage>,
    }

    fn fixture(auto_join: bool) -> Fixture {
        let (radio, control) = SimRadio::new(Ipv4Addr::new(192, 168, 0, 9), auto_join);
        let (coordinator_tx, coordinator_rx) = mailbox("coordinator", 8);
        let (network_tx, network_rx) = mailbox("network", 8);
        spawn(
            NetworkActor::new(Box::new(radio), coordinator_tx, network_tx.clone()),
            network_rx,
        );
        Fixture {
            control,
            network_tx,
            coordinator_rx,
        }
    }

    async fn expect_coordinator(rx: &mut MailboxReceiver<CoordinatorMessage>) -> CoordinatorMessage {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("no coordinator notification")
            .expect("coordinator mailbox closed")
    }

    #[tokio::test]
    async fn oversized_credentials_fail_fast() {
        let fx = fixture(true);
        fx.network_tx
            .send(NetworkMessage::Connect {
                ssid: "s".repeat(MAX_SSID_BYTES + 1),
                passphrase: "p".to_string(),
            })
            .await
            .unwrap();
        fx.network_tx
            .send(NetworkMessage::Connect {
                ssid: "net".to_string(),
                passphrase: "p".repeat(MAX_PASSPHRASE_BYTES + 1),
            })
            .await
            .unwrap();
        // Let the worker chew through both requests.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fx.control.join_requests().is_empty());
    }

    #[tokio::test]
    async fn limit_boundary_values_are_accepted() {
        let fx = fixture(false);
        fx.network_tx
            .send(NetworkMessage::Connect {
                ssid: "s".repeat(MAX_SSID_BYTES),
                passphrase: "p".repeat(MAX_PASSPHRASE_BYTES),
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fx.control.join_requests().len(), 1);
    }

    #[tokio::test]
    async fn join_completion_notifies_coordinator_with_address() {
        let mut fx = fixture(false);
        fx.network_tx
            .send(NetworkMessage::Connect {
                ssid: "Home".to_string(),
                passphrase: "secret1".to_string(),
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            fx.control.join_requests(),
            vec![("Home".to_string(), "secret1".to_string())]
        );

        fx.control.complete_join();
        match expect_coordinator(&mut fx.coordinator_rx).await {
            CoordinatorMessage::NetworkUp(address) => {
                assert_eq!(address, Ipv4Addr::new(192, 168, 0, 9));
            }
            other => panic!("expected NetworkUp, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lost_link_notifies_coordinator() {
        let mut fx = fixture(true);
        fx.network_tx
            .send(NetworkMessage::Connect {
                ssid: "Home".to_string(),
                passphrase: "secret1".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(
            expect_coordinator(&mut fx.coordinator_rx).await,
            CoordinatorMessage::NetworkUp(_)
        ));

        fx.control.drop_link();
        assert!(matches!(
            expect_coordinator(&mut fx.coordinator_rx).await,
            CoordinatorMessage::NetworkDown
        ));
    }

    #[tokio::test]
    async fn disconnect_when_not_associated_is_a_no_op() {
        let fx = fixture(false);
        fx.network_tx.send(NetworkMessage::Disconnect).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fx.control.leave_requests(), 0);
    }
}
