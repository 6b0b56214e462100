//! Indicator actor.
//!
//! Owns the four-lamp bank and the board status lamp. The bank state is
//! mirrored into the status snapshot after the hardware accepted it, which
//! is where `get_led` reads it back.

use async_trait::async_trait;
use device_actors::{Actor, Flow};
use device_hal::IndicatorBank;
use device_types::{IndicatorMessage, StatusSnapshot};
use tracing::error;

pub struct IndicatorActor {
    bank: Box<dyn IndicatorBank>,
    snapshot: StatusSnapshot,
}

impl IndicatorActor {
    pub fn new(bank: Box<dyn IndicatorBank>, snapshot: StatusSnapshot) -> Self {
        Self { bank, snapshot }
    }
}

#[async_trait]
impl Actor for IndicatorActor {
    type Message = IndicatorMessage;

    fn name(&self) -> &'static str {
        "indicator"
    }

    async fn handle(&mut self, msg: IndicatorMessage) -> anyhow::Result<Flow> {
        match msg {
            IndicatorMessage::SetBank(states) => match self.bank.set_bank(states) {
                Ok(()) => self.snapshot.update(|s| s.led = states),
                Err(e) => error!(error = %e, "failed to drive lamp bank"),
            },
            IndicatorMessage::SetStatus(on) => {
                if let Err(e) = self.bank.set_status(on) {
                    error!(error = %e, "failed to drive status lamp");
                }
            }
            IndicatorMessage::Quit => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_actors::{mailbox, spawn};
    use device_hal::sim::SimIndicators;
    use std::time::Duration;

    #[tokio::test]
    async fn bank_state_reaches_hardware_and_snapshot() {
        let (bank, control) = SimIndicators::new();
        let snapshot = StatusSnapshot::new();
        let (tx, rx) = mailbox("indicator", 8);
        spawn(IndicatorActor::new(Box::new(bank), snapshot.clone()), rx);

        tx.send(IndicatorMessage::SetBank([true, false, true, false]))
            .await
            .unwrap();
        tx.send(IndicatorMessage::SetStatus(true)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(control.bank(), [true, false, true, false]);
        assert!(control.status());
        assert_eq!(snapshot.load().led, [true, false, true, false]);
    }
}
