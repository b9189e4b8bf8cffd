//! MQTT port — outbound publish/subscribe primitives plus the inbound
//! event stream delivered by the transport adapter.

use std::future::Future;

use castbridge_domain::error::BridgeError;

/// Outbound MQTT operations the bridge needs.
///
/// This is a **port** — the transport adapter wraps a concrete client
/// behind it. Inbound traffic does not flow through the trait: the adapter
/// delivers [`MqttEvent`]s over a channel so the coordination loop stays
/// the single consumer.
pub trait MqttPublisher: Send + Sync {
    /// Publish `payload` to `topic`, optionally retained.
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Register interest in a command topic.
    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Cleanly disconnect from the broker. Publishes issued before this
    /// call may still be in flight; callers flush with a bounded delay.
    fn disconnect(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

/// Connection-lifecycle and message events delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MqttEvent {
    /// Broker acknowledged a (re)connection; discovery must (re)run.
    Connected,
    /// Connection lost. Reconnection and backoff are the transport's
    /// responsibility; entities are stale until the next [`Connected`](Self::Connected).
    Disconnected,
    /// Inbound message on a subscribed topic.
    Message { topic: String, payload: Vec<u8> },
}
