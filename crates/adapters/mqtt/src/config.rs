//! MQTT transport configuration.

use serde::Deserialize;

/// Connection settings for the MQTT broker.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker hostname or IP address.
    pub host: String,
    /// Broker TCP port.
    pub port: u16,
    /// Username; credentials are only sent when both username and password
    /// are non-empty.
    pub username: String,
    /// Password.
    pub password: String,
    /// Client identifier presented to the broker.
    pub client_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u64,
    /// Capacity of the client request queue and the inbound event channel.
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: String::new(),
            password: String::new(),
            client_id: "castbridge".to_string(),
            keep_alive_secs: 60,
            channel_capacity: 100,
        }
    }
}

impl MqttConfig {
    /// Whether credentials should be presented to the broker.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1883);
        assert_eq!(config.client_id, "castbridge");
        assert!(!config.has_credentials());
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: MqttConfig = toml::from_str(
            "
            host = 'broker.local'
            username = 'obs'
            password = 'hunter2'
            ",
        )
        .unwrap();
        assert_eq!(config.host, "broker.local");
        assert_eq!(config.port, 1883);
        assert!(config.has_credentials());
    }

    #[test]
    fn should_require_both_credential_halves() {
        let config = MqttConfig {
            username: "obs".to_string(),
            ..MqttConfig::default()
        };
        assert!(!config.has_credentials());
    }
}
