//! Discovery/lifecycle orchestrator — the bridge session and its
//! coordination loop.
//!
//! One [`BridgeSession`] owns every piece of mutable bridge state (the
//! sensor, the persistent switches, the profile registry) and is driven by
//! exactly one task: [`run`](BridgeSession::run) drains the MQTT event
//! channel, the studio event channel, and the poll timer through a single
//! `select!`. Queue order is the serialization mechanism — a profile
//! command that arrives while a profile-list rebuild is in progress sits
//! behind it in the channel and resolves against the rebuilt registry.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use castbridge_domain::attributes::SensorAttributes;
use castbridge_domain::discovery::DeviceIdentity;
use castbridge_domain::error::BridgeError;
use castbridge_domain::event::StudioEvent;
use castbridge_domain::state::SensorState;
use castbridge_domain::switch::{SwitchPayload, SwitchType};

use crate::entity::{PersistentSwitches, ProfileRegistry, Sensor, Switch};
use crate::ports::{MqttEvent, MqttPublisher, Studio};
use crate::router;

/// Delay after retracting profile configs, letting the broker propagate the
/// removals before the replacement configs land.
const REBUILD_SETTLE: Duration = Duration::from_millis(100);

/// Delay before disconnecting at shutdown so in-flight publishes flush.
const SHUTDOWN_FLUSH: Duration = Duration::from_millis(500);

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Disconnected,
    Discovering,
    Steady,
    Disconnecting,
}

/// Static options the session is wired with.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Base MQTT channel all topics hang off.
    pub base_channel: String,
    /// Sensor/device name segment.
    pub sensor_name: String,
    /// Whether remote control (switch entities) is enabled.
    pub control: bool,
    /// Device identity block shared by all entities.
    pub device: DeviceIdentity,
    /// Poll interval for the status refresh timer.
    pub poll_interval: Duration,
}

/// The bridge's session state — entities, registry, and lifecycle phase.
///
/// All methods take `&mut self`; the type is meant to be owned by the
/// coordination loop, not shared.
pub struct BridgeSession<M, S> {
    mqtt: M,
    studio: S,
    options: BridgeOptions,
    phase: Phase,
    sensor: Option<Sensor>,
    persistent: Option<PersistentSwitches>,
    profiles: ProfileRegistry,
}

impl<M: MqttPublisher, S: Studio> BridgeSession<M, S> {
    #[must_use]
    pub fn new(mqtt: M, studio: S, options: BridgeOptions) -> Self {
        Self {
            mqtt,
            studio,
            options,
            phase: Phase::Disconnected,
            sensor: None,
            persistent: None,
            profiles: ProfileRegistry::default(),
        }
    }

    /// Drain all three concurrency sources until `shutdown` resolves or
    /// both event channels close, then run the shutdown sequence.
    pub async fn run(
        mut self,
        mut mqtt_events: mpsc::Receiver<MqttEvent>,
        mut studio_events: mpsc::Receiver<StudioEvent>,
        shutdown: impl Future<Output = ()>,
    ) {
        let mut poll = tokio::time::interval(self.options.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                event = mqtt_events.recv() => match event {
                    Some(event) => {
                        if let Err(error) = self.handle_mqtt_event(event).await {
                            tracing::warn!(%error, "failed to handle MQTT event");
                        }
                    }
                    None => break,
                },
                event = studio_events.recv() => match event {
                    Some(event) => {
                        if let Err(error) = self.handle_studio_event(event).await {
                            tracing::warn!(%error, "failed to handle studio event");
                        }
                    }
                    None => break,
                },
                _ = poll.tick() => {
                    if let Err(error) = self.refresh().await {
                        tracing::warn!(%error, "status refresh failed");
                    }
                }
            }
        }

        // Cancel the poll source before the final publish sequence so no
        // refresh races the shutdown publishes.
        drop(poll);
        self.shutdown().await;
    }

    /// Handle one transport event.
    ///
    /// # Errors
    ///
    /// Propagates transport/studio failures; callers log and continue, the
    /// next discovery handshake self-heals.
    pub async fn handle_mqtt_event(&mut self, event: MqttEvent) -> Result<(), BridgeError> {
        match event {
            MqttEvent::Connected => {
                tracing::info!("MQTT connection established");
                self.run_discovery().await
            }
            MqttEvent::Disconnected => {
                // Reconnection and backoff belong to the transport; entities
                // are stale until the next ConnAck re-runs discovery.
                tracing::warn!("MQTT connection lost");
                self.phase = Phase::Disconnected;
                Ok(())
            }
            MqttEvent::Message { topic, payload } => self.handle_message(&topic, &payload).await,
        }
    }

    /// Handle one studio lifecycle event.
    ///
    /// # Errors
    ///
    /// Propagates transport/studio failures; callers log and continue.
    pub async fn handle_studio_event(&mut self, event: StudioEvent) -> Result<(), BridgeError> {
        if self.phase != Phase::Steady {
            tracing::debug!(?event, "dropping studio event outside steady state");
            return Ok(());
        }
        match event {
            StudioEvent::ProfileChanged => self.handle_profile_changed().await,
            StudioEvent::ProfileListChanged => self.handle_profile_list_changed().await,
            output => self.handle_output_event(&output).await,
        }
    }

    /// Poll tick: re-assert availability, detect state edges, publish
    /// attributes while live.
    ///
    /// # Errors
    ///
    /// Propagates transport/studio failures; callers log and continue.
    pub async fn refresh(&mut self) -> Result<(), BridgeError> {
        match self.phase {
            Phase::Steady => {}
            // A half-finished handshake heals on the next tick.
            Phase::Discovering => return self.run_discovery().await,
            Phase::Disconnected | Phase::Disconnecting => return Ok(()),
        }

        if let Some(persistent) = &self.persistent {
            for switch in persistent.iter() {
                switch.publish_availability(&self.mqtt, SwitchPayload::On).await?;
            }
        }

        let status = self.studio.status().await?;
        let Some(sensor) = self.sensor.as_mut() else {
            return Ok(());
        };
        let change = sensor.observe(&status);

        if change.entered(SensorState::Stopped) {
            tracing::debug!("publishing final stopped snapshot");
            sensor.publish_state(&self.mqtt, change.current).await?;
            let perf = self.studio.perf().await?;
            sensor
                .publish_attributes(&self.mqtt, &SensorAttributes::new(&status, &perf))
                .await?;
        } else if change.current.is_active() {
            let perf = self.studio.perf().await?;
            sensor
                .publish_attributes(&self.mqtt, &SensorAttributes::new(&status, &perf))
                .await?;
        }
        Ok(())
    }

    /// Final publish sequence and disconnect. Every step is best-effort:
    /// a failed publish is logged and the remaining steps still run.
    pub async fn shutdown(&mut self) {
        if self.phase == Phase::Disconnected {
            tracing::info!("shutting down while disconnected; nothing to retract");
            return;
        }
        self.phase = Phase::Disconnecting;

        if let Some(sensor) = self.sensor.as_mut() {
            log_best_effort(
                "terminal off state",
                sensor.publish_off_state(&self.mqtt).await,
            );
        }
        if let Some(persistent) = &self.persistent {
            for switch in persistent.iter() {
                log_best_effort(
                    "availability off",
                    switch.publish_availability(&self.mqtt, SwitchPayload::Off).await,
                );
            }
        }
        for switch in self.profiles.drain() {
            log_best_effort("profile retraction", switch.retract(&self.mqtt).await);
        }

        tokio::time::sleep(SHUTDOWN_FLUSH).await;
        log_best_effort("disconnect", self.mqtt.disconnect().await);
        self.phase = Phase::Disconnected;
        tracing::info!("bridge session closed");
    }

    /// Full discovery handshake, run on every successful connect.
    /// Republishing configs and states is idempotent by design.
    async fn run_discovery(&mut self) -> Result<(), BridgeError> {
        self.phase = Phase::Discovering;

        let status = self.studio.status().await?;
        let perf = self.studio.perf().await?;
        let mut sensor = Sensor::new(
            &self.options.base_channel,
            &self.options.sensor_name,
            self.options.device.clone(),
        );
        sensor
            .announce(&self.mqtt, &status, &SensorAttributes::new(&status, &perf))
            .await?;
        self.sensor = Some(sensor);

        if self.options.control {
            self.rebuild_profiles().await?;

            let persistent = PersistentSwitches::new(
                &self.options.base_channel,
                &self.options.sensor_name,
                &self.options.device,
            );
            for switch in persistent.iter() {
                switch.announce(&self.mqtt).await?;
            }
            self.persistent = Some(persistent);
        }

        self.phase = Phase::Steady;
        tracing::info!(
            control = self.options.control,
            profiles = self.profiles.switches().len(),
            "discovery complete"
        );
        Ok(())
    }

    /// Query the studio and rebuild the profile registry from scratch,
    /// announcing one switch per profile and marking the current one.
    async fn rebuild_profiles(&mut self) -> Result<(), BridgeError> {
        let current = self.studio.current_profile().await?;
        let names = self.studio.list_profiles().await?;

        self.profiles = ProfileRegistry::default();
        for name in names {
            let switch = Switch::profile(
                &name,
                &self.options.base_channel,
                &self.options.sensor_name,
                self.options.device.clone(),
            );
            switch.announce(&self.mqtt).await?;
            if name == current {
                switch.publish_state(&self.mqtt, SwitchPayload::On).await?;
                self.profiles.set_current(&name);
            }
            self.profiles.push(switch);
        }
        Ok(())
    }

    async fn handle_profile_changed(&mut self) -> Result<(), BridgeError> {
        if !self.options.control {
            return Ok(());
        }
        let new = self.studio.current_profile().await?;
        if self.profiles.current_name() == Some(new.as_str()) {
            return Ok(());
        }

        if let Some(old) = self.profiles.current() {
            old.publish_state(&self.mqtt, SwitchPayload::Off).await?;
        }
        if let Some(switch) = self.profiles.find_by_name(&new) {
            switch.publish_state(&self.mqtt, SwitchPayload::On).await?;
            self.profiles.set_current(new);
            tracing::info!("profile changed");
        } else {
            // A list-change rebuild will reconcile the registry shortly.
            self.profiles.clear_current();
            tracing::warn!(profile = %new, "current profile missing from registry");
        }
        Ok(())
    }

    async fn handle_profile_list_changed(&mut self) -> Result<(), BridgeError> {
        if !self.options.control {
            return Ok(());
        }
        for switch in self.profiles.drain() {
            switch.retract(&self.mqtt).await?;
        }
        // Let the broker propagate the removals before republishing.
        tokio::time::sleep(REBUILD_SETTLE).await;
        self.rebuild_profiles().await?;
        tracing::info!(
            profiles = self.profiles.switches().len(),
            "profile list rebuilt"
        );
        Ok(())
    }

    async fn handle_output_event(&mut self, event: &StudioEvent) -> Result<(), BridgeError> {
        let status = self.studio.status().await?;
        if let Some(sensor) = self.sensor.as_mut() {
            let change = sensor.observe(&status);
            sensor.publish_state(&self.mqtt, change.current).await?;
            if event.is_start() {
                let perf = self.studio.perf().await?;
                sensor
                    .publish_attributes(&self.mqtt, &SensorAttributes::new(&status, &perf))
                    .await?;
            }
        }

        if let Some(persistent) = &self.persistent {
            if let Some((kind, payload)) = output_switch(event) {
                if let Some(switch) = persistent.by_kind(kind) {
                    switch.publish_state(&self.mqtt, payload).await?;
                }
            }
        }
        Ok(())
    }

    async fn handle_message(&mut self, topic: &str, payload: &[u8]) -> Result<(), BridgeError> {
        if self.phase != Phase::Steady {
            return Ok(());
        }
        let Ok(payload) = std::str::from_utf8(payload) else {
            tracing::debug!(topic, "ignoring non-UTF-8 payload");
            return Ok(());
        };
        tracing::debug!(topic, payload, "inbound message");

        let Some(target) = router::route(topic, self.persistent.as_ref(), &self.profiles) else {
            // Expected under retained-message replay; not an error.
            tracing::debug!(topic, "no entity registered for topic");
            return Ok(());
        };
        let kind = target.kind();
        let name = target.name().to_string();

        match kind {
            SwitchType::Profile => self.activate_profile(&name).await,
            kind => self.drive_output(kind, payload).await,
        }
    }

    /// Profile commands: any payload means "activate this profile".
    async fn activate_profile(&mut self, name: &str) -> Result<(), BridgeError> {
        if self.sensor.as_ref().is_some_and(Sensor::active) {
            tracing::info!(profile = name, "refusing profile switch while output is live");
            return Ok(());
        }
        if self.profiles.current_name() == Some(name) {
            tracing::debug!(profile = name, "already on requested profile");
            return Ok(());
        }
        // State publishes follow once the studio raises ProfileChanged.
        self.studio.set_current_profile(name).await
    }

    /// Stream/virtual-camera/record commands: ON starts, OFF stops. The
    /// confirmed state arrives later via studio events, never as an echo.
    async fn drive_output(&mut self, kind: SwitchType, payload: &str) -> Result<(), BridgeError> {
        let Ok(payload) = payload.parse::<SwitchPayload>() else {
            tracing::debug!(%kind, payload, "ignoring unknown switch payload");
            return Ok(());
        };
        match (kind, payload) {
            (SwitchType::Stream, SwitchPayload::On) => self.studio.start_streaming().await,
            (SwitchType::Stream, SwitchPayload::Off) => self.studio.stop_streaming().await,
            (SwitchType::VirtualCamera, SwitchPayload::On) => {
                self.studio.start_virtual_camera().await
            }
            (SwitchType::VirtualCamera, SwitchPayload::Off) => {
                self.studio.stop_virtual_camera().await
            }
            (SwitchType::Record, SwitchPayload::On) => self.studio.start_recording().await,
            (SwitchType::Record, SwitchPayload::Off) => self.studio.stop_recording().await,
            (SwitchType::Profile, _) => Ok(()),
        }
    }
}

fn output_switch(event: &StudioEvent) -> Option<(SwitchType, SwitchPayload)> {
    match event {
        StudioEvent::RecordingStarted => Some((SwitchType::Record, SwitchPayload::On)),
        StudioEvent::RecordingStopped => Some((SwitchType::Record, SwitchPayload::Off)),
        StudioEvent::StreamingStarted => Some((SwitchType::Stream, SwitchPayload::On)),
        StudioEvent::StreamingStopped => Some((SwitchType::Stream, SwitchPayload::Off)),
        StudioEvent::VirtualCameraStarted => Some((SwitchType::VirtualCamera, SwitchPayload::On)),
        StudioEvent::VirtualCameraStopped => Some((SwitchType::VirtualCamera, SwitchPayload::Off)),
        StudioEvent::ProfileChanged | StudioEvent::ProfileListChanged => None,
    }
}

fn log_best_effort(what: &'static str, result: Result<(), BridgeError>) {
    if let Err(error) = result {
        tracing::warn!(%error, what, "shutdown step failed");
    }
}
