//! clubstatus - club occupancy, door lock and traffic light controller
//!
//! Watches the occupancy and lock inputs, drives the power and traffic light
//! relays and mirrors occupancy to MQTT. Runs until Ctrl+C, then leaves the
//! relays in the shutdown state (power on, red and green lit).
//!
//! Module structure:
//! - `domain/` - Core types (relay channels, light combinations, samples)
//! - `io/` - External interfaces (GPIO, I2C relay bank, MQTT)
//! - `services/` - Control logic (power hysteresis, traffic light, loop)
//! - `infra/` - Infrastructure (Config, errors)

use anyhow::Context;
use clap::Parser;
use clubstatus::infra::{Config, HardwareBackend};
use clubstatus::io::hardware::{DigitalInputs, RegisterBus};
use clubstatus::io::sim::{SimBus, SimInputs};
use clubstatus::io::{MqttStatusSink, RelayBank, SensorSampler};
use clubstatus::services::{Controller, StatusPublisher};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Club status relay controller
#[derive(Parser, Debug)]
#[command(name = "clubstatus", version, about)]
struct Args {
    /// Path to TOML configuration file (default: configuration.toml next to the binary)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use in-memory sensors and relays instead of the GPIO/I2C hardware
    #[arg(long)]
    simulate: bool,
}

type Hardware = (Box<dyn DigitalInputs>, Box<dyn RegisterBus>);

fn open_hardware(config: &Config) -> anyhow::Result<Hardware> {
    match config.hardware_backend() {
        HardwareBackend::Sim => {
            info!("hardware_simulated");
            Ok((Box::new(SimInputs::new()), Box::new(SimBus::new())))
        }
        HardwareBackend::Rpi => open_rpi(config),
    }
}

#[cfg(target_os = "linux")]
fn open_rpi(config: &Config) -> anyhow::Result<Hardware> {
    use clubstatus::io::rpi::{RpiBus, RpiInputs};

    let inputs = RpiInputs::open(config.occupancy_pin(), config.lock_pin())
        .map_err(|e| anyhow::anyhow!(e))
        .context("sensors: failed to open GPIO inputs")?;
    let bus = RpiBus::open(config.i2c_bus())
        .map_err(|e| anyhow::anyhow!(e))
        .context("relay_bank: failed to open I2C bus")?;
    Ok((Box::new(inputs), Box::new(bus)))
}

#[cfg(not(target_os = "linux"))]
fn open_rpi(_config: &Config) -> anyhow::Result<Hardware> {
    anyhow::bail!("hardware backend \"rpi\" needs Linux, use --simulate")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO. Diagnostics go to stderr, stdout carries the status lines.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(version = %env!("CARGO_PKG_VERSION"), git = %env!("GIT_HASH"), "clubstatus starting");

    let args = Args::parse();

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_from_path(&config_path).context("config")?;
    if args.simulate {
        config = config.with_hardware_backend(HardwareBackend::Sim);
    }

    info!(
        config_file = %config.config_file(),
        mqtt_host = %config.mqtt_host(),
        mqtt_port = %config.mqtt_port(),
        mqtt_topic = %config.mqtt_topic(),
        backend = ?config.hardware_backend(),
        power_trigger = ?config.power_trigger(),
        "config_loaded"
    );

    let (inputs, bus) = open_hardware(&config)?;

    // Relays go to a known all-off state before anything else runs
    let relays = RelayBank::new(bus).context("relay_bank: initial write failed")?;
    let sampler = SensorSampler::new(inputs);

    let sink = MqttStatusSink::connect(&config);
    let publisher = StatusPublisher::new(config.mqtt_topic(), Box::new(sink));

    let controller = Controller::new(sampler, relays, publisher, config.power_trigger());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "signal_handler_failed");
            std::future::pending::<()>().await;
        }
        info!("shutdown_signal_received");
    };

    controller.run(shutdown).await?;

    info!("clubstatus shutdown complete");
    Ok(())
}
