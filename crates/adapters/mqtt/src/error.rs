//! MQTT transport adapter error types.

use castbridge_domain::error::{BridgeError, TransportError};

/// Errors specific to the MQTT transport adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The client's request queue rejected the operation.
    #[error("MQTT client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),
}

impl MqttError {
    /// Convert into a [`BridgeError::Transport`] for propagation across the
    /// port boundary, tagged with the operation that failed.
    #[must_use]
    pub fn into_domain(self, context: &'static str) -> BridgeError {
        BridgeError::Transport(TransportError::new(context, self.to_string()))
    }
}
