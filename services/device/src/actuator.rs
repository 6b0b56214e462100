//! Actuator actor.
//!
//! Serializes angle commands onto the pulse driver. Trim is a calibration
//! offset added to every commanded angle.

use async_trait::async_trait;
use device_actors::{Actor, Flow};
use device_hal::PulseDriver;
use device_types::ActuatorMessage;
use tracing::{debug, error, warn};

pub struct ActuatorActor {
    driver: Box<dyn PulseDriver>,
    angle: f64,
    trim: f64,
}

impl ActuatorActor {
    pub fn new(driver: Box<dyn PulseDriver>) -> Self {
        Self {
            driver,
            angle: 0.0,
            trim: 0.0,
        }
    }

    fn apply(&mut self) {
        if !self.driver.ready() {
            warn!("pulse driver not initialized, ignoring angle command");
            return;
        }
        let target = self.angle + self.trim;
        debug!(angle = self.angle, trim = self.trim, target, "driving actuator");
        if let Err(e) = self.driver.set_angle(target) {
            error!(error = %e, "failed to drive actuator");
        }
    }
}

#[async_trait]
impl Actor for ActuatorActor {
    type Message = ActuatorMessage;

    fn name(&self) -> &'static str {
        "actuator"
    }

    async fn handle(&mut self, msg: ActuatorMessage) -> anyhow::Result<Flow> {
        match msg {
            ActuatorMessage::SetAngle(degrees) => {
                self.angle = degrees;
                self.apply();
            }
            ActuatorMessage::SetTrim(degrees) => {
                self.trim = degrees;
                self.apply();
            }
            ActuatorMessage::Quit => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }
}
