//! Runtime entity model — the sensor and switches as discovered over MQTT.
//!
//! Constructing an entity only builds its topics and discovery payload;
//! `announce` is what brings it into the discovered world, always in the
//! same order: config → subscribe(command) → initial state (→ availability
//! for persistent kinds). A failure partway through leaves the entity
//! half-discovered; the next discovery handshake self-heals, so there is
//! no rollback.

use castbridge_domain::attributes::SensorAttributes;
use castbridge_domain::discovery::{DeviceIdentity, DiscoveryConfig};
use castbridge_domain::error::BridgeError;
use castbridge_domain::state::{SensorState, StateChange, StateTracker, StatusSnapshot};
use castbridge_domain::switch::{SwitchPayload, SwitchType};
use castbridge_domain::topic::{SensorTopics, SwitchTopics};

use crate::ports::MqttPublisher;

/// The singleton read-only status sensor.
///
/// Recreated from scratch on every successful MQTT connect; its discovery
/// config is deliberately not retained.
#[derive(Debug)]
pub struct Sensor {
    topics: SensorTopics,
    config: DiscoveryConfig,
    tracker: StateTracker,
}

impl Sensor {
    #[must_use]
    pub fn new(base_channel: &str, sensor_name: &str, device: DeviceIdentity) -> Self {
        let topics = SensorTopics::new(base_channel, sensor_name);
        let config = DiscoveryConfig::sensor(sensor_name, device, &topics);
        Self {
            topics,
            config,
            tracker: StateTracker::new(),
        }
    }

    /// Run the discovery handshake: config, then the current state, then
    /// the attributes snapshot.
    pub async fn announce(
        &mut self,
        mqtt: &impl MqttPublisher,
        status: &StatusSnapshot,
        attributes: &SensorAttributes,
    ) -> Result<(), BridgeError> {
        mqtt.publish(&self.topics.config, self.config.to_payload()?, false)
            .await?;
        tracing::debug!(entity = %self.config.name, "published sensor config");

        let change = self.tracker.observe(status);
        self.publish_state(mqtt, change.current).await?;
        self.publish_attributes(mqtt, attributes).await
    }

    /// Fold a fresh status snapshot into the tracker.
    pub fn observe(&mut self, status: &StatusSnapshot) -> StateChange {
        self.tracker.observe(status)
    }

    /// Whether the last observation had any output live.
    #[must_use]
    pub fn active(&self) -> bool {
        self.tracker.active()
    }

    pub async fn publish_state(
        &self,
        mqtt: &impl MqttPublisher,
        state: SensorState,
    ) -> Result<(), BridgeError> {
        mqtt.publish(&self.topics.state, state.as_str().into(), false)
            .await?;
        tracing::debug!(entity = %self.config.name, %state, "sensor state changed");
        Ok(())
    }

    pub async fn publish_attributes(
        &self,
        mqtt: &impl MqttPublisher,
        attributes: &SensorAttributes,
    ) -> Result<(), BridgeError> {
        mqtt.publish(
            &self.topics.attributes,
            serde_json::to_vec(attributes)?,
            false,
        )
        .await?;
        tracing::debug!(entity = %self.config.name, "sensor attributes updated");
        Ok(())
    }

    /// Publish the terminal `Off` state. Only ever called at shutdown.
    pub async fn publish_off_state(&mut self, mqtt: &impl MqttPublisher) -> Result<(), BridgeError> {
        self.tracker.mark_off();
        self.publish_state(mqtt, SensorState::Off).await
    }
}

/// One controllable switch entity, tagged by kind.
///
/// A single struct covers all four kinds; the capability differences
/// (retained config, availability topic, retraction) hang off
/// [`SwitchType`]'s predicates rather than a type hierarchy.
#[derive(Debug, Clone)]
pub struct Switch {
    kind: SwitchType,
    name: String,
    topics: SwitchTopics,
    config: DiscoveryConfig,
}

impl Switch {
    /// Build a persistent switch (`record`, `stream`, `virtual_camera`).
    #[must_use]
    pub fn persistent(
        kind: SwitchType,
        base_channel: &str,
        sensor_name: &str,
        device: DeviceIdentity,
    ) -> Self {
        let topics = SwitchTopics::persistent(base_channel, sensor_name, kind);
        let config = DiscoveryConfig::persistent_switch(kind, sensor_name, device, &topics);
        Self {
            kind,
            name: sensor_name.to_string(),
            topics,
            config,
        }
    }

    /// Build an ephemeral profile switch.
    #[must_use]
    pub fn profile(
        profile_name: &str,
        base_channel: &str,
        sensor_name: &str,
        device: DeviceIdentity,
    ) -> Self {
        let topics = SwitchTopics::profile(base_channel, profile_name);
        let config = DiscoveryConfig::profile_switch(profile_name, sensor_name, device, &topics);
        Self {
            kind: SwitchType::Profile,
            name: profile_name.to_string(),
            topics,
            config,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SwitchType {
        self.kind
    }

    /// The profile name for profile switches, the sensor name otherwise.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn command_topic(&self) -> &str {
        &self.topics.command
    }

    /// Run the discovery handshake: config → subscribe → state OFF, then
    /// availability ON for persistent kinds.
    pub async fn announce(&self, mqtt: &impl MqttPublisher) -> Result<(), BridgeError> {
        mqtt.publish(
            &self.topics.config,
            self.config.to_payload()?,
            self.kind.is_retained(),
        )
        .await?;
        tracing::debug!(entity = %self.config.name, "published switch config");

        mqtt.subscribe(&self.topics.command).await?;
        tracing::debug!(entity = %self.config.name, topic = %self.topics.command, "subscribed");

        self.publish_state(mqtt, SwitchPayload::Off).await?;

        if self.kind.has_availability() {
            self.publish_availability(mqtt, SwitchPayload::On).await?;
        }
        Ok(())
    }

    pub async fn publish_state(
        &self,
        mqtt: &impl MqttPublisher,
        payload: SwitchPayload,
    ) -> Result<(), BridgeError> {
        mqtt.publish(&self.topics.state, payload.as_str().into(), false)
            .await?;
        tracing::debug!(entity = %self.config.name, %payload, "switch state changed");
        Ok(())
    }

    /// Publish availability. A no-op for kinds without an availability
    /// topic.
    pub async fn publish_availability(
        &self,
        mqtt: &impl MqttPublisher,
        payload: SwitchPayload,
    ) -> Result<(), BridgeError> {
        let Some(topic) = self.topics.availability.as_deref() else {
            return Ok(());
        };
        mqtt.publish(topic, payload.as_str().into(), false).await?;
        tracing::debug!(entity = %self.config.name, %payload, "switch availability set");
        Ok(())
    }

    /// Delete the entity from Home Assistant by publishing an empty config
    /// payload.
    pub async fn retract(&self, mqtt: &impl MqttPublisher) -> Result<(), BridgeError> {
        mqtt.publish(&self.topics.config, Vec::new(), false).await?;
        tracing::debug!(entity = %self.config.name, "removed switch config");
        Ok(())
    }
}

/// The three always-available control switches, in announce order.
#[derive(Debug)]
pub struct PersistentSwitches {
    pub stream: Switch,
    pub virtual_camera: Switch,
    pub record: Switch,
}

impl PersistentSwitches {
    #[must_use]
    pub fn new(base_channel: &str, sensor_name: &str, device: &DeviceIdentity) -> Self {
        Self {
            stream: Switch::persistent(SwitchType::Stream, base_channel, sensor_name, device.clone()),
            virtual_camera: Switch::persistent(
                SwitchType::VirtualCamera,
                base_channel,
                sensor_name,
                device.clone(),
            ),
            record: Switch::persistent(SwitchType::Record, base_channel, sensor_name, device.clone()),
        }
    }

    /// Iterate in the announce order: stream, virtual camera, record.
    pub fn iter(&self) -> impl Iterator<Item = &Switch> {
        [&self.stream, &self.virtual_camera, &self.record].into_iter()
    }

    #[must_use]
    pub fn by_kind(&self, kind: SwitchType) -> Option<&Switch> {
        match kind {
            SwitchType::Stream => Some(&self.stream),
            SwitchType::VirtualCamera => Some(&self.virtual_camera),
            SwitchType::Record => Some(&self.record),
            SwitchType::Profile => None,
        }
    }
}

/// The live set of profile switches plus the "current" marker.
///
/// Rebuilt wholesale whenever the studio's profile list changes; at most
/// one profile is current at any time.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    switches: Vec<Switch>,
    current: Option<String>,
}

impl ProfileRegistry {
    #[must_use]
    pub fn switches(&self) -> &[Switch] {
        &self.switches
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    pub fn push(&mut self, switch: Switch) {
        self.switches.push(switch);
    }

    /// Remove every switch for retraction, clearing the current marker.
    pub fn drain(&mut self) -> Vec<Switch> {
        self.current = None;
        std::mem::take(&mut self.switches)
    }

    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn set_current(&mut self, name: impl Into<String>) {
        self.current = Some(name.into());
    }

    /// Drop the current marker (e.g. when the marked profile disappeared).
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    #[must_use]
    pub fn current(&self) -> Option<&Switch> {
        let name = self.current.as_deref()?;
        self.find_by_name(name)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Switch> {
        self.switches.iter().find(|switch| switch.name() == name)
    }

    /// Exact command-topic match against the live registry.
    #[must_use]
    pub fn find_by_command_topic(&self, topic: &str) -> Option<&Switch> {
        self.switches
            .iter()
            .find(|switch| switch.command_topic() == topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castbridge_domain::state::PerfSample;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    /// What a fake transport saw, in order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum BusOp {
        Publish {
            topic: String,
            payload: Vec<u8>,
            retain: bool,
        },
        Subscribe {
            topic: String,
        },
        Disconnect,
    }

    #[derive(Debug, Clone, Default)]
    struct RecordingBus {
        ops: Arc<Mutex<Vec<BusOp>>>,
    }

    impl RecordingBus {
        fn ops(&self) -> Vec<BusOp> {
            self.ops.lock().unwrap().clone()
        }
    }

    impl MqttPublisher for RecordingBus {
        fn publish(
            &self,
            topic: &str,
            payload: Vec<u8>,
            retain: bool,
        ) -> impl Future<Output = Result<(), BridgeError>> + Send {
            self.ops.lock().unwrap().push(BusOp::Publish {
                topic: topic.to_string(),
                payload,
                retain,
            });
            async { Ok(()) }
        }

        fn subscribe(&self, topic: &str) -> impl Future<Output = Result<(), BridgeError>> + Send {
            self.ops.lock().unwrap().push(BusOp::Subscribe {
                topic: topic.to_string(),
            });
            async { Ok(()) }
        }

        fn disconnect(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
            self.ops.lock().unwrap().push(BusOp::Disconnect);
            async { Ok(()) }
        }
    }

    fn device() -> DeviceIdentity {
        DeviceIdentity::new("obs", "3f2a9c")
    }

    #[tokio::test]
    async fn should_announce_sensor_as_config_then_state_then_attributes() {
        let bus = RecordingBus::default();
        let mut sensor = Sensor::new("home/obs", "obs", device());
        let status = StatusSnapshot::default();
        let attributes = SensorAttributes::new(&status, &PerfSample::default());

        sensor.announce(&bus, &status, &attributes).await.unwrap();

        let ops = bus.ops();
        assert_eq!(ops.len(), 3);
        assert!(matches!(
            &ops[0],
            BusOp::Publish { topic, retain: false, .. } if topic == "home/obs/sensor/obs/config"
        ));
        assert!(matches!(
            &ops[1],
            BusOp::Publish { topic, payload, .. }
                if topic == "home/obs/sensor/obs/state" && payload == b"Stopped"
        ));
        assert!(matches!(
            &ops[2],
            BusOp::Publish { topic, .. } if topic == "home/obs/sensor/obs/attributes"
        ));
    }

    #[tokio::test]
    async fn should_announce_persistent_switch_in_discovery_order() {
        let bus = RecordingBus::default();
        let switch = Switch::persistent(SwitchType::Stream, "home/obs", "obs", device());

        switch.announce(&bus).await.unwrap();

        let ops = bus.ops();
        assert_eq!(ops.len(), 4);
        assert!(matches!(
            &ops[0],
            BusOp::Publish { topic, retain: true, .. } if topic == "home/obs/switch/obs_stream/config"
        ));
        assert!(matches!(
            &ops[1],
            BusOp::Subscribe { topic } if topic == "home/obs/switch/obs/stream/set"
        ));
        assert!(matches!(
            &ops[2],
            BusOp::Publish { topic, payload, .. }
                if topic == "home/obs/switch/obs/stream/state" && payload == b"OFF"
        ));
        assert!(matches!(
            &ops[3],
            BusOp::Publish { topic, payload, .. }
                if topic == "home/obs/switch/obs/stream/available" && payload == b"ON"
        ));
    }

    #[tokio::test]
    async fn should_not_retain_profile_switch_config() {
        let bus = RecordingBus::default();
        let switch = Switch::profile("Default", "home/obs", "obs", device());

        switch.announce(&bus).await.unwrap();

        let ops = bus.ops();
        // No availability step for ephemeral switches.
        assert_eq!(ops.len(), 3);
        assert!(matches!(
            &ops[0],
            BusOp::Publish { topic, retain: false, .. } if topic == "home/obs/switch/Default/config"
        ));
    }

    #[tokio::test]
    async fn should_retract_profile_switch_with_empty_payload() {
        let bus = RecordingBus::default();
        let switch = Switch::profile("Default", "home/obs", "obs", device());

        switch.retract(&bus).await.unwrap();

        assert_eq!(
            bus.ops(),
            vec![BusOp::Publish {
                topic: "home/obs/switch/Default/config".to_string(),
                payload: Vec::new(),
                retain: false,
            }]
        );
    }

    #[tokio::test]
    async fn should_skip_availability_publish_for_profile_switch() {
        let bus = RecordingBus::default();
        let switch = Switch::profile("Default", "home/obs", "obs", device());

        switch
            .publish_availability(&bus, SwitchPayload::On)
            .await
            .unwrap();

        assert!(bus.ops().is_empty());
    }

    #[tokio::test]
    async fn should_publish_terminal_off_state() {
        let bus = RecordingBus::default();
        let mut sensor = Sensor::new("home/obs", "obs", device());
        sensor.observe(&StatusSnapshot {
            recording: true,
            ..StatusSnapshot::default()
        });
        assert!(sensor.active());

        sensor.publish_off_state(&bus).await.unwrap();

        assert!(!sensor.active());
        assert!(matches!(
            &bus.ops()[0],
            BusOp::Publish { topic, payload, .. }
                if topic == "home/obs/sensor/obs/state" && payload == b"Off"
        ));
    }

    #[test]
    fn should_iterate_persistent_switches_in_announce_order() {
        let set = PersistentSwitches::new("home/obs", "obs", &device());
        let kinds: Vec<SwitchType> = set.iter().map(Switch::kind).collect();
        assert_eq!(
            kinds,
            vec![
                SwitchType::Stream,
                SwitchType::VirtualCamera,
                SwitchType::Record
            ]
        );
    }

    #[test]
    fn should_look_up_persistent_switch_by_kind() {
        let set = PersistentSwitches::new("home/obs", "obs", &device());
        assert_eq!(
            set.by_kind(SwitchType::Record).unwrap().kind(),
            SwitchType::Record
        );
        assert!(set.by_kind(SwitchType::Profile).is_none());
    }

    #[test]
    fn should_track_current_profile_in_registry() {
        let mut registry = ProfileRegistry::default();
        registry.push(Switch::profile("Default", "home/obs", "obs", device()));
        registry.push(Switch::profile("Late Night", "home/obs", "obs", device()));
        registry.set_current("Default");

        assert_eq!(registry.current_name(), Some("Default"));
        assert_eq!(registry.current().unwrap().name(), "Default");
    }

    #[test]
    fn should_find_profile_by_exact_command_topic() {
        let mut registry = ProfileRegistry::default();
        registry.push(Switch::profile("Default", "home/obs", "obs", device()));

        let found = registry.find_by_command_topic("home/obs/switch/Default/profile/set");
        assert_eq!(found.unwrap().name(), "Default");

        assert!(
            registry
                .find_by_command_topic("home/obs/switch/Other/profile/set")
                .is_none()
        );
    }

    #[test]
    fn should_clear_current_marker_when_drained() {
        let mut registry = ProfileRegistry::default();
        registry.push(Switch::profile("Default", "home/obs", "obs", device()));
        registry.set_current("Default");

        let drained = registry.drain();
        assert_eq!(drained.len(), 1);
        assert!(registry.is_empty());
        assert!(registry.current_name().is_none());
    }
}
