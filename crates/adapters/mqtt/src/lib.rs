//! # castbridge-adapter-mqtt
//!
//! MQTT transport adapter — wraps `rumqttc` behind the bridge's
//! [`MqttPublisher`] port.
//!
//! ## How it works
//!
//! [`MqttTransport::connect`] builds the client and spawns the **event
//! pump**: a task that polls the `rumqttc` event loop forever and
//! translates its packets into [`MqttEvent`]s on a channel. Reconnects and
//! backoff stay inside the event loop; the bridge only sees
//! `Connected`/`Disconnected` edges and re-runs discovery on each connect.
//!
//! Connect-time failures (DNS, refused connection, bad credentials) are
//! not fatal: they surface as warnings and a `Disconnected` event, and the
//! pump keeps retrying.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `castbridge-app` and
//! `castbridge-domain`.

mod config;
mod error;

pub use config::MqttConfig;
pub use error::MqttError;

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use castbridge_app::ports::{MqttEvent, MqttPublisher};
use castbridge_domain::error::BridgeError;

/// Pause between reconnect attempts after a connection error.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// rumqttc-backed implementation of the [`MqttPublisher`] port.
#[derive(Debug, Clone)]
pub struct MqttTransport {
    client: AsyncClient,
}

impl MqttTransport {
    /// Build the client and spawn the event pump.
    ///
    /// Returns the port implementation, the inbound event stream, and the
    /// pump task handle. The pump stops on its own once the receiver is
    /// dropped.
    #[must_use]
    pub fn connect(config: &MqttConfig) -> (Self, mpsc::Receiver<MqttEvent>, JoinHandle<()>) {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
        if config.has_credentials() {
            options.set_credentials(&config.username, &config.password);
        }

        let (client, event_loop) = AsyncClient::new(options, config.channel_capacity);
        let (events_tx, events_rx) = mpsc::channel(config.channel_capacity);
        let pump = tokio::spawn(run_pump(event_loop, events_tx));

        tracing::info!(
            host = %config.host,
            port = config.port,
            client_id = %config.client_id,
            "MQTT transport started"
        );
        (Self { client }, events_rx, pump)
    }
}

impl MqttPublisher for MqttTransport {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let client = self.client.clone();
        let topic = topic.to_string();
        async move {
            client
                .publish(topic, QoS::AtLeastOnce, retain, payload)
                .await
                .map_err(|err| MqttError::from(err).into_domain("publish"))
        }
    }

    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let client = self.client.clone();
        let topic = topic.to_string();
        async move {
            client
                .subscribe(topic, QoS::AtLeastOnce)
                .await
                .map_err(|err| MqttError::from(err).into_domain("subscribe"))
        }
    }

    fn disconnect(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let client = self.client.clone();
        async move {
            client
                .disconnect()
                .await
                .map_err(|err| MqttError::from(err).into_domain("disconnect"))
        }
    }
}

/// Poll the event loop forever, translating packets into [`MqttEvent`]s.
async fn run_pump(mut event_loop: EventLoop, events: mpsc::Sender<MqttEvent>) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                tracing::info!(code = ?ack.code, "broker acknowledged connection");
                if events.send(MqttEvent::Connected).await.is_err() {
                    break;
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let event = MqttEvent::Message {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "MQTT connection error");
                if events.send(MqttEvent::Disconnected).await.is_err() {
                    break;
                }
                // The event loop reconnects on the next poll; don't spin.
                tokio::time::sleep(RECONNECT_BACKOFF).await;
            }
        }
    }
    tracing::debug!("MQTT event pump stopped");
}

use std::future::Future;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_expose_a_cloneable_port_handle() {
        let (transport, events_rx, pump) = MqttTransport::connect(&MqttConfig::default());

        // The port handle is cheap to clone and share.
        let _second = transport.clone();

        drop(events_rx);
        pump.abort();
    }

    #[tokio::test]
    async fn should_stop_pump_when_receiver_dropped() {
        let config = MqttConfig {
            // Unroutable host: the pump hits the error path immediately.
            host: "127.0.0.1".to_string(),
            port: 1,
            ..MqttConfig::default()
        };
        let (_transport, events_rx, pump) = MqttTransport::connect(&config);

        drop(events_rx);
        // The first failed send (after the error backoff) ends the task.
        pump.await.unwrap();
    }
}
