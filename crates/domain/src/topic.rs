//! MQTT topic namespace — pure derivation plus the reverse kind lookup.
//!
//! All topics hang off a configured base channel; the Home Assistant
//! discovery component (`sensor`/`switch`) is always the first segment
//! after it.

use crate::switch::SwitchType;

/// Topics owned by the aggregate status sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTopics {
    pub config: String,
    pub state: String,
    pub attributes: String,
}

impl SensorTopics {
    #[must_use]
    pub fn new(base_channel: &str, sensor_name: &str) -> Self {
        Self {
            config: format!("{base_channel}/sensor/{sensor_name}/config"),
            state: format!("{base_channel}/sensor/{sensor_name}/state"),
            attributes: format!("{base_channel}/sensor/{sensor_name}/attributes"),
        }
    }
}

/// Topics owned by one switch entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTopics {
    pub config: String,
    pub state: String,
    pub command: String,
    /// Present for persistent kinds only.
    pub availability: Option<String>,
}

impl SwitchTopics {
    /// Topics for a persistent switch (`record`, `stream`, `virtual_camera`).
    ///
    /// The config topic gets its own `<sensor>_<kind>` segment while the
    /// runtime topics share the `<sensor>/<kind>` subtree.
    #[must_use]
    pub fn persistent(base_channel: &str, sensor_name: &str, kind: SwitchType) -> Self {
        debug_assert!(kind.has_availability(), "profile switches are not persistent");
        let kind = kind.as_str();
        Self {
            config: format!("{base_channel}/switch/{sensor_name}_{kind}/config"),
            state: format!("{base_channel}/switch/{sensor_name}/{kind}/state"),
            command: format!("{base_channel}/switch/{sensor_name}/{kind}/set"),
            availability: Some(format!(
                "{base_channel}/switch/{sensor_name}/{kind}/available"
            )),
        }
    }

    /// Topics for an ephemeral profile switch.
    ///
    /// The command topic carries the `profile` family segment so inbound
    /// messages can be routed without consulting the registry first.
    #[must_use]
    pub fn profile(base_channel: &str, profile_name: &str) -> Self {
        Self {
            config: format!("{base_channel}/switch/{profile_name}/config"),
            state: format!("{base_channel}/switch/{profile_name}/state"),
            command: format!("{base_channel}/switch/{profile_name}/profile/set"),
            availability: None,
        }
    }
}

/// Recover the switch family addressed by an inbound command topic.
///
/// Command topics end in `<kind>/set`; anything else — state echoes,
/// retained foreign traffic, malformed paths — yields `None`, which callers
/// treat as a silent no-op.
#[must_use]
pub fn command_topic_kind(topic: &str) -> Option<SwitchType> {
    let mut segments = topic.rsplit('/');
    if segments.next()? != "set" {
        return None;
    }
    segments.next()?.parse().ok()
}
