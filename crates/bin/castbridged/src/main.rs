//! # castbridged — castbridge daemon
//!
//! Composition root that wires the adapters together and runs the bridge.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env var overrides)
//! - Initialize tracing
//! - Resolve the machine identity for the discovery device block
//! - Construct the studio adapter and the MQTT transport
//! - Hand everything to the bridge session's coordination loop
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no bridge logic belongs here.

mod config;
mod identity;

use castbridge_adapter_mqtt::MqttTransport;
use castbridge_adapter_virtual::VirtualStudio;
use castbridge_app::session::{BridgeOptions, BridgeSession};
use castbridge_domain::discovery::DeviceIdentity;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use config::Config;

/// Capacity of the studio lifecycle event channel.
const STUDIO_EVENT_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.logging.effective_filter()))
        .init();

    let token = identity::machine_token(&config.bridge.sensor_name);
    let device = DeviceIdentity::new(config.bridge.sensor_name.clone(), token);

    // Studio collaborator. Only the virtual adapter is built in; the
    // config validator has already rejected anything else.
    let (studio_events_tx, studio_events) = mpsc::channel(STUDIO_EVENT_CAPACITY);
    let studio = VirtualStudio::new();
    studio.attach_events(studio_events_tx);

    // MQTT transport; reconnects are its own business.
    let (mqtt, mqtt_events, _pump) = MqttTransport::connect(&config.mqtt);

    let options = BridgeOptions {
        base_channel: config.bridge.base_channel.clone(),
        sensor_name: config.bridge.sensor_name.clone(),
        control: config.bridge.control,
        device,
        poll_interval: config.poll_interval(),
    };

    tracing::info!(
        base_channel = %options.base_channel,
        sensor_name = %options.sensor_name,
        control = options.control,
        interval_secs = config.bridge.interval_secs,
        "castbridged starting"
    );

    let session = BridgeSession::new(mqtt, studio, options);
    session
        .run(mqtt_events, studio_events, async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(%error, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
