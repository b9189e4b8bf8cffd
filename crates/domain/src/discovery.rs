//! Home Assistant MQTT discovery payloads.
//!
//! A retained JSON blob on a well-known config topic tells Home Assistant
//! an entity exists and how to display/control it. All entities of one
//! bridge instance share the same device block, keyed by a stable machine
//! token, so Home Assistant groups them (and restarts) under one device.

use serde::{Deserialize, Serialize};

use crate::switch::{SwitchPayload, SwitchType};
use crate::topic::{SensorTopics, SwitchTopics};

/// Device identity block shared by every entity of one bridge instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub name: String,
    /// Stable per-machine token; must survive restarts.
    pub identifiers: Vec<String>,
    pub manufacturer: String,
    pub sw_version: String,
}

impl DeviceIdentity {
    #[must_use]
    pub fn new(name: impl Into<String>, machine_token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifiers: vec![machine_token.into()],
            manufacturer: "castbridge".to_string(),
            sw_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Availability block advertised by persistent switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    pub topic: String,
    pub payload_available: SwitchPayload,
    pub payload_not_available: SwitchPayload,
}

impl AvailabilityConfig {
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload_available: SwitchPayload::On,
            payload_not_available: SwitchPayload::Off,
        }
    }
}

/// One entity's discovery config payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    pub name: String,
    pub unique_id: String,
    pub device: DeviceIdentity,
    pub state_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<SwitchPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<SwitchPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_attributes_topic: Option<String>,
}

impl DiscoveryConfig {
    /// Config for the aggregate status sensor.
    #[must_use]
    pub fn sensor(sensor_name: &str, device: DeviceIdentity, topics: &SensorTopics) -> Self {
        Self {
            name: sensor_name.to_string(),
            unique_id: sensor_name.to_string(),
            device,
            state_topic: topics.state.clone(),
            command_topic: None,
            payload_on: None,
            payload_off: None,
            availability: None,
            icon: None,
            json_attributes_topic: Some(topics.attributes.clone()),
        }
    }

    /// Config for a persistent switch of the given kind.
    #[must_use]
    pub fn persistent_switch(
        kind: SwitchType,
        sensor_name: &str,
        device: DeviceIdentity,
        topics: &SwitchTopics,
    ) -> Self {
        Self {
            name: format!("{sensor_name} {}", kind.label()),
            unique_id: format!("{sensor_name}_{kind}"),
            device,
            state_topic: topics.state.clone(),
            command_topic: Some(topics.command.clone()),
            payload_on: Some(SwitchPayload::On),
            payload_off: Some(SwitchPayload::Off),
            availability: topics.availability.as_deref().map(AvailabilityConfig::new),
            icon: Some(kind_icon(kind).to_string()),
            json_attributes_topic: None,
        }
    }

    /// Config for an ephemeral profile switch.
    #[must_use]
    pub fn profile_switch(
        profile_name: &str,
        sensor_name: &str,
        device: DeviceIdentity,
        topics: &SwitchTopics,
    ) -> Self {
        Self {
            name: format!("{profile_name} Profile"),
            unique_id: format!("{sensor_name}_{profile_name}_profile"),
            device,
            state_topic: topics.state.clone(),
            command_topic: Some(topics.command.clone()),
            payload_on: Some(SwitchPayload::On),
            payload_off: Some(SwitchPayload::Off),
            availability: None,
            icon: Some(profile_icon(profile_name)),
            json_attributes_topic: None,
        }
    }

    /// Serialize the payload for publishing.
    ///
    /// Serialization is deterministic (fixed struct field order), so
    /// republishing an unchanged config yields byte-identical output.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error, which for this payload
    /// shape only occurs on allocation failure.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn kind_icon(kind: SwitchType) -> &'static str {
    match kind {
        SwitchType::Record => "mdi:record",
        _ => "mdi:broadcast",
    }
}

/// `mdi:alpha-<letter>-box` badge for a profile, from the first ASCII
/// letter of its name; anything else falls back to a neutral icon.
fn profile_icon(profile_name: &str) -> String {
    match profile_name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {
            format!("mdi:alpha-{}-box", c.to_ascii_lowercase())
        }
        _ => "mdi:video-switch".to_string(),
    }
}
