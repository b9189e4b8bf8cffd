//! # castbridge-adapter-virtual
//!
//! Virtual/demo studio — a simulated host application for testing and
//! demonstration purposes.
//!
//! ## Behaviour
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `start_*` / `stop_*` | Flip the matching flag and emit the lifecycle event; redundant calls are no-ops and emit nothing |
//! | `set_current_profile` | Switch profile and emit `ProfileChanged`; unknown names fail |
//! | `install_profiles` (test helper) | Replace the profile list and emit `ProfileListChanged` |
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `castbridge-app` and
//! `castbridge-domain`.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use castbridge_app::ports::Studio;
use castbridge_domain::error::{BridgeError, StudioCallError};
use castbridge_domain::event::StudioEvent;
use castbridge_domain::state::{PerfSample, StatusSnapshot};

#[derive(Debug)]
struct VirtualState {
    status: StatusSnapshot,
    perf: PerfSample,
    profiles: Vec<String>,
    current: String,
    events: Option<mpsc::Sender<StudioEvent>>,
}

impl Default for VirtualState {
    fn default() -> Self {
        Self {
            status: StatusSnapshot::default(),
            perf: PerfSample {
                fps: 30.0,
                frame_time_ns: 33_333_333,
                frames: 0,
                lagged_frames: 0,
            },
            profiles: vec!["Default".to_string()],
            current: "Default".to_string(),
            events: None,
        }
    }
}

/// Simulated studio implementing the [`Studio`] port.
///
/// Cheap to clone; all clones share the same state, so tests can drive the
/// studio from one handle while the bridge session queries another.
#[derive(Debug, Clone, Default)]
pub struct VirtualStudio {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualStudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the lifecycle event channel the bridge drains.
    pub fn attach_events(&self, sender: mpsc::Sender<StudioEvent>) {
        self.lock().events = Some(sender);
    }

    /// Replace the profile list wholesale and emit `ProfileListChanged`.
    ///
    /// # Panics
    ///
    /// Panics if `current` is not part of `profiles`.
    pub fn install_profiles(&self, profiles: &[&str], current: &str) {
        assert!(
            profiles.contains(&current),
            "current profile must be part of the list"
        );
        {
            let mut state = self.lock();
            state.profiles = profiles.iter().map(ToString::to_string).collect();
            state.current = current.to_string();
        }
        self.emit(StudioEvent::ProfileListChanged);
    }

    /// Advance the simulated frame counters.
    pub fn advance_frames(&self, frames: u64, lagged: u64) {
        let mut state = self.lock();
        state.perf.frames += frames;
        state.perf.lagged_frames += lagged;
    }

    fn lock(&self) -> MutexGuard<'_, VirtualState> {
        self.state.lock().expect("virtual studio state poisoned")
    }

    fn emit(&self, event: StudioEvent) {
        let sender = self.lock().events.clone();
        if let Some(sender) = sender {
            if let Err(err) = sender.try_send(event) {
                tracing::warn!(error = %err, "dropped studio event");
            }
        }
    }

    /// Flip one status flag; returns whether anything changed.
    fn set_flag(&self, pick: impl Fn(&mut StatusSnapshot) -> &mut bool, on: bool) -> bool {
        let mut state = self.lock();
        let flag = pick(&mut state.status);
        if *flag == on {
            return false;
        }
        *flag = on;
        true
    }

    fn toggle(
        &self,
        pick: impl Fn(&mut StatusSnapshot) -> &mut bool,
        on: bool,
        event: StudioEvent,
    ) {
        // Redundant start/stop calls are no-ops at the collaborator
        // boundary and emit no event.
        if self.set_flag(pick, on) {
            self.emit(event);
        }
    }
}

impl Studio for VirtualStudio {
    fn status(&self) -> impl Future<Output = Result<StatusSnapshot, BridgeError>> + Send {
        let status = self.lock().status;
        async move { Ok(status) }
    }

    fn perf(&self) -> impl Future<Output = Result<PerfSample, BridgeError>> + Send {
        let perf = self.lock().perf;
        async move { Ok(perf) }
    }

    fn current_profile(&self) -> impl Future<Output = Result<String, BridgeError>> + Send {
        let current = self.lock().current.clone();
        async move { Ok(current) }
    }

    fn list_profiles(&self) -> impl Future<Output = Result<Vec<String>, BridgeError>> + Send {
        let profiles = self.lock().profiles.clone();
        async move { Ok(profiles) }
    }

    fn set_current_profile(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let result = {
            let mut state = self.lock();
            if state.profiles.iter().any(|profile| profile == name) {
                state.current = name.to_string();
                Ok(())
            } else {
                Err(BridgeError::Studio(StudioCallError::new(
                    "set_current_profile",
                    format!("unknown profile `{name}`"),
                )))
            }
        };
        if result.is_ok() {
            self.emit(StudioEvent::ProfileChanged);
        }
        async move { result }
    }

    fn start_recording(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.toggle(|s| &mut s.recording, true, StudioEvent::RecordingStarted);
        async { Ok(()) }
    }

    fn stop_recording(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.toggle(|s| &mut s.recording, false, StudioEvent::RecordingStopped);
        async { Ok(()) }
    }

    fn start_streaming(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.toggle(|s| &mut s.streaming, true, StudioEvent::StreamingStarted);
        async { Ok(()) }
    }

    fn stop_streaming(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.toggle(|s| &mut s.streaming, false, StudioEvent::StreamingStopped);
        async { Ok(()) }
    }

    fn start_virtual_camera(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.toggle(
            |s| &mut s.virtual_camera,
            true,
            StudioEvent::VirtualCameraStarted,
        );
        async { Ok(()) }
    }

    fn stop_virtual_camera(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.toggle(
            |s| &mut s.virtual_camera,
            false,
            StudioEvent::VirtualCameraStopped,
        );
        async { Ok(()) }
    }
}
