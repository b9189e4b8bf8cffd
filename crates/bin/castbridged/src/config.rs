//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `castbridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use castbridge_adapter_mqtt::MqttConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// MQTT broker settings.
    pub mqtt: MqttConfig,
    /// Bridge behaviour settings.
    pub bridge: BridgeConfig,
    /// Studio collaborator selection.
    pub studio: StudioConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Bridge behaviour configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base MQTT channel all topics hang off.
    pub base_channel: String,
    /// Sensor/device name segment.
    pub sensor_name: String,
    /// Status poll interval in seconds (1–3600).
    pub interval_secs: u64,
    /// Allow remote control of start/stop/profile actions over MQTT.
    pub control: bool,
}

/// Studio collaborator configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Which studio adapter to run against. Only `virtual` is built in.
    pub adapter: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
    /// Shortcut that lowers the default filter to `debug`.
    pub debug: bool,
}

impl Config {
    /// Load configuration from `castbridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("castbridge.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CASTBRIDGE_MQTT_HOST") {
            self.mqtt.host = val;
        }
        if let Ok(val) = std::env::var("CASTBRIDGE_MQTT_PORT") {
            if let Ok(port) = val.parse() {
                self.mqtt.port = port;
            }
        }
        if let Ok(val) = std::env::var("CASTBRIDGE_MQTT_USERNAME") {
            self.mqtt.username = val;
        }
        if let Ok(val) = std::env::var("CASTBRIDGE_MQTT_PASSWORD") {
            self.mqtt.password = val;
        }
        if let Ok(val) = std::env::var("CASTBRIDGE_BASE_CHANNEL") {
            self.bridge.base_channel = val;
        }
        if let Ok(val) = std::env::var("CASTBRIDGE_SENSOR_NAME") {
            self.bridge.sensor_name = val;
        }
        if let Ok(val) = std::env::var("CASTBRIDGE_INTERVAL") {
            if let Ok(interval) = val.parse() {
                self.bridge.interval_secs = interval;
            }
        }
        if let Ok(val) = std::env::var("CASTBRIDGE_CONTROL") {
            if let Ok(control) = val.parse() {
                self.bridge.control = control;
            }
        }
        if let Ok(val) = std::env::var("CASTBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.port == 0 {
            return Err(ConfigError::Validation(
                "mqtt port must be non-zero".to_string(),
            ));
        }
        if !(1..=3600).contains(&self.bridge.interval_secs) {
            return Err(ConfigError::Validation(format!(
                "interval_secs must be within 1..=3600, got {}",
                self.bridge.interval_secs
            )));
        }
        if self.bridge.sensor_name.is_empty() {
            return Err(ConfigError::Validation(
                "sensor_name must not be empty".to_string(),
            ));
        }
        if self.bridge.base_channel.is_empty() {
            return Err(ConfigError::Validation(
                "base_channel must not be empty".to_string(),
            ));
        }
        if self.studio.adapter != "virtual" {
            return Err(ConfigError::Validation(format!(
                "unknown studio adapter `{}` (only `virtual` is built in)",
                self.studio.adapter
            )));
        }
        Ok(())
    }

    /// The poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.bridge.interval_secs)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_channel: "castbridge".to_string(),
            sensor_name: "studio".to_string(),
            interval_secs: 5,
            control: false,
        }
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            adapter: "virtual".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "castbridged=info,castbridge=info".to_string(),
            debug: false,
        }
    }
}

impl LoggingConfig {
    /// The filter directive to install, honouring the `debug` shortcut
    /// unless an explicit filter was configured.
    #[must_use]
    pub fn effective_filter(&self) -> String {
        if self.debug && self.filter == Self::default().filter {
            "debug".to_string()
        } else {
            self.filter.clone()
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.bridge.base_channel, "castbridge");
        assert_eq!(config.bridge.sensor_name, "studio");
        assert_eq!(config.bridge.interval_secs, 5);
        assert!(!config.bridge.control);
        assert_eq!(config.studio.adapter, "virtual");
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.bridge.interval_secs, 5);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [mqtt]
            host = 'broker.local'
            port = 8883
            username = 'obs'
            password = 'hunter2'

            [bridge]
            base_channel = 'home/obs'
            sensor_name = 'obs'
            interval_secs = 30
            control = true

            [studio]
            adapter = 'virtual'

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 8883);
        assert!(config.mqtt.has_credentials());
        assert_eq!(config.bridge.base_channel, "home/obs");
        assert_eq!(config.bridge.sensor_name, "obs");
        assert_eq!(config.bridge.interval_secs, 30);
        assert!(config.bridge.control);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.bridge.interval_secs, 5);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.mqtt.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_out_of_range_interval() {
        let mut config = Config::default();
        config.bridge.interval_secs = 0;
        assert!(config.validate().is_err());

        config.bridge.interval_secs = 3601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_interval_bounds() {
        let mut config = Config::default();
        config.bridge.interval_secs = 1;
        assert!(config.validate().is_ok());

        config.bridge.interval_secs = 3600;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_empty_sensor_name() {
        let mut config = Config::default();
        config.bridge.sensor_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_base_channel() {
        let mut config = Config::default();
        config.bridge.base_channel = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_unknown_studio_adapter() {
        let mut config = Config::default();
        config.studio.adapter = "obs-websocket".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_convert_interval_to_duration() {
        let mut config = Config::default();
        config.bridge.interval_secs = 30;
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn should_lower_filter_when_debug_requested() {
        let logging = LoggingConfig {
            debug: true,
            ..LoggingConfig::default()
        };
        assert_eq!(logging.effective_filter(), "debug");
    }

    #[test]
    fn should_keep_explicit_filter_over_debug_shortcut() {
        let logging = LoggingConfig {
            filter: "castbridged=trace".to_string(),
            debug: true,
        };
        assert_eq!(logging.effective_filter(), "castbridged=trace");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
