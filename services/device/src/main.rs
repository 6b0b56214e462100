//! paneld entry point, running on simulated hardware.
//!
//! A host directory plays the removable medium: drop a `config` file with
//! `ssid=`/`pass=` lines and an `index.html` next to it, and the device
//! walks its whole startup sequence — mount, connect, serve.

use clap::Parser;
use device_hal::sim::{SimButton, SimIndicators, SimPanel, SimPulse, SimRadio, SimStorage};
use device_types::DeviceInfo;
use paneld::{Device, DeviceOptions, Drivers};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory that plays the removable medium
    #[arg(long, default_value = "./card")]
    card: PathBuf,

    /// Port the web server binds on the acquired address
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Address the simulated radio acquires
    #[arg(long, default_value = "127.0.0.1")]
    address: Ipv4Addr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paneld=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!(card = %args.card.display(), port = args.port, "starting paneld on simulated hardware");

    let (storage, storage_control) = SimStorage::new(args.card.clone());
    let (radio, _radio_control) = SimRadio::new(args.address, true);
    let (panel, _panel_control) = SimPanel::new();
    let (pulse, _pulse_control) = SimPulse::new();
    let (indicators, _indicator_control) = SimIndicators::new();
    let (button, _button_control) = SimButton::new();

    let device = Device::assemble(
        DeviceOptions {
            http_port: args.port,
            info: DeviceInfo::simulated(),
        },
        Drivers {
            storage: Box::new(storage),
            radio: Box::new(radio),
            panel: Box::new(panel),
            pulse: Box::new(pulse),
            indicators: Box::new(indicators),
            button: Box::new(button),
        },
    );

    // The medium is in the slot from the start.
    storage_control.set_level(true);

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    device.shutdown().await;
    Ok(())
}
