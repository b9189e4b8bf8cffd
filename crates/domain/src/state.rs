//! Sensor state machine — derives a discrete state from the studio's
//! boolean output signals and tracks the previous state for edge detection.

use std::fmt;

/// Instantaneous boolean outputs sampled from the studio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub recording: bool,
    pub streaming: bool,
    pub virtual_camera: bool,
    pub paused: bool,
    pub replay_buffer: bool,
}

/// Performance counters sampled from the studio.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerfSample {
    pub fps: f64,
    pub frame_time_ns: u64,
    pub frames: u64,
    pub lagged_frames: u64,
}

/// Discrete state exposed on the sensor's state topic.
///
/// Always derived from a [`StatusSnapshot`], except for the terminal
/// [`Off`](Self::Off) published once at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Off,
    Stopped,
    Recording,
    Streaming,
    RecordingAndStreaming,
    VirtualCamera,
}

impl SensorState {
    /// Derive the state from the studio's output signals.
    ///
    /// Precedence, highest first: recording+streaming, streaming, recording,
    /// virtual camera. The virtual camera is the lowest positive signal —
    /// it is ignored whenever recording or streaming is also on.
    #[must_use]
    pub fn derive(snapshot: &StatusSnapshot) -> Self {
        match (snapshot.recording, snapshot.streaming) {
            (true, true) => Self::RecordingAndStreaming,
            (false, true) => Self::Streaming,
            (true, false) => Self::Recording,
            (false, false) if snapshot.virtual_camera => Self::VirtualCamera,
            (false, false) => Self::Stopped,
        }
    }

    /// Whether any output is live in this state.
    #[must_use]
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Stopped | Self::Off)
    }

    /// The exact string published on the state topic.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Stopped => "Stopped",
            Self::Recording => "Recording",
            Self::Streaming => "Streaming",
            Self::RecordingAndStreaming => "Recording and Streaming",
            Self::VirtualCamera => "Virtual Camera",
        }
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one [`StateTracker::observe`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub previous: SensorState,
    pub current: SensorState,
}

impl StateChange {
    /// True when this observation transitioned *into* `state`.
    #[must_use]
    pub fn entered(self, state: SensorState) -> bool {
        self.current == state && self.previous != state
    }
}

/// Remembers the previously observed state so the polling loop can detect
/// edges (e.g. the final transition into `Stopped`).
///
/// `observe` mutates the tracker on every call. Calling it twice without an
/// intervening signal change is safe (the second call reports no edge), but
/// it must only ever be driven from a single task — the coordination loop —
/// since concurrent observers would race on `previous`.
#[derive(Debug)]
pub struct StateTracker {
    previous: SensorState,
    active: bool,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            previous: SensorState::Off,
            active: false,
        }
    }
}

impl StateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a fresh snapshot into the tracker, returning the transition.
    ///
    /// The previous value is captured *before* it is overwritten, so edge
    /// checks compare against the genuinely prior observation.
    pub fn observe(&mut self, snapshot: &StatusSnapshot) -> StateChange {
        let current = SensorState::derive(snapshot);
        let previous = self.previous;
        self.previous = current;
        self.active = current.is_active();
        StateChange { previous, current }
    }

    /// Force the terminal `Off` state at shutdown.
    pub fn mark_off(&mut self) {
        self.previous = SensorState::Off;
        self.active = false;
    }

    /// Whether the last observation had any output live.
    #[must_use]
    pub fn active(&self) -> bool {
        self.active
    }

    /// The most recently observed state.
    #[must_use]
    pub fn last(&self) -> SensorState {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(recording: bool, streaming: bool, virtual_camera: bool) -> StatusSnapshot {
        StatusSnapshot {
            recording,
            streaming,
            virtual_camera,
            ..StatusSnapshot::default()
        }
    }

    #[test]
    fn should_apply_documented_precedence_for_all_signal_triples() {
        let cases = [
            ((false, false, false), SensorState::Stopped),
            ((false, false, true), SensorState::VirtualCamera),
            ((false, true, false), SensorState::Streaming),
            ((false, true, true), SensorState::Streaming),
            ((true, false, false), SensorState::Recording),
            ((true, false, true), SensorState::Recording),
            ((true, true, false), SensorState::RecordingAndStreaming),
            ((true, true, true), SensorState::RecordingAndStreaming),
        ];

        for ((recording, streaming, virtual_camera), expected) in cases {
            let got = SensorState::derive(&snapshot(recording, streaming, virtual_camera));
            assert_eq!(
                got, expected,
                "({recording}, {streaming}, {virtual_camera})"
            );
        }
    }

    #[test]
    fn should_display_exact_wire_strings() {
        assert_eq!(SensorState::Off.to_string(), "Off");
        assert_eq!(SensorState::Stopped.to_string(), "Stopped");
        assert_eq!(
            SensorState::RecordingAndStreaming.to_string(),
            "Recording and Streaming"
        );
        assert_eq!(SensorState::VirtualCamera.to_string(), "Virtual Camera");
    }

    #[test]
    fn should_treat_only_stopped_and_off_as_inactive() {
        assert!(!SensorState::Stopped.is_active());
        assert!(!SensorState::Off.is_active());
        assert!(SensorState::Recording.is_active());
        assert!(SensorState::Streaming.is_active());
        assert!(SensorState::RecordingAndStreaming.is_active());
        assert!(SensorState::VirtualCamera.is_active());
    }

    #[test]
    fn should_start_with_previous_off() {
        let mut tracker = StateTracker::new();
        let change = tracker.observe(&snapshot(false, false, false));
        assert_eq!(change.previous, SensorState::Off);
        assert_eq!(change.current, SensorState::Stopped);
    }

    #[test]
    fn should_capture_previous_before_overwriting() {
        let mut tracker = StateTracker::new();
        tracker.observe(&snapshot(true, false, false));

        let change = tracker.observe(&snapshot(false, false, false));
        assert_eq!(change.previous, SensorState::Recording);
        assert_eq!(change.current, SensorState::Stopped);
        assert!(change.entered(SensorState::Stopped));
    }

    #[test]
    fn should_report_no_edge_when_observed_twice_without_change() {
        let mut tracker = StateTracker::new();
        tracker.observe(&snapshot(false, false, false));

        let change = tracker.observe(&snapshot(false, false, false));
        assert!(!change.entered(SensorState::Stopped));
    }

    #[test]
    fn should_track_active_flag() {
        let mut tracker = StateTracker::new();
        assert!(!tracker.active());

        tracker.observe(&snapshot(false, true, false));
        assert!(tracker.active());

        tracker.observe(&snapshot(false, false, false));
        assert!(!tracker.active());
    }

    #[test]
    fn should_force_terminal_off() {
        let mut tracker = StateTracker::new();
        tracker.observe(&snapshot(true, true, false));

        tracker.mark_off();
        assert_eq!(tracker.last(), SensorState::Off);
        assert!(!tracker.active());
    }
}
