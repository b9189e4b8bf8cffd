//! Common error types used across the workspace.
//!
//! Each layer defines typed errors and converts via `#[from]`; adapter
//! crates keep their transport-specific error types to themselves and
//! convert into [`BridgeError`] at the port boundary.

/// Failure raised by the MQTT transport, stripped of transport-crate types.
#[derive(Debug, thiserror::Error)]
#[error("{context}: {message}")]
pub struct TransportError {
    /// What the bridge was doing (e.g. `"publish"`, `"subscribe"`).
    pub context: &'static str,
    /// Rendered transport-level cause.
    pub message: String,
}

impl TransportError {
    #[must_use]
    pub fn new(context: &'static str, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }
}

/// Failure raised by the studio collaborator.
#[derive(Debug, thiserror::Error)]
#[error("studio call `{call}` failed: {message}")]
pub struct StudioCallError {
    /// The collaborator operation that failed (e.g. `"set_current_profile"`).
    pub call: &'static str,
    pub message: String,
}

impl StudioCallError {
    #[must_use]
    pub fn new(call: &'static str, message: impl Into<String>) -> Self {
        Self {
            call,
            message: message.into(),
        }
    }
}

/// Top-level bridge error.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// MQTT transport failure (broker unreachable, publish refused, …).
    #[error("MQTT transport error")]
    Transport(#[from] TransportError),

    /// Studio collaborator failure.
    #[error("studio error")]
    Studio(#[from] StudioCallError),

    /// Payload serialization failure.
    #[error("failed to serialize payload")]
    Serialization(#[from] serde_json::Error),
}
