//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside
//! world. They are defined here (in `app`) so that both the orchestrator
//! and the adapter layer can depend on them without creating circular
//! dependencies.

pub mod mqtt;
pub mod studio;

pub use mqtt::{MqttEvent, MqttPublisher};
pub use studio::Studio;
