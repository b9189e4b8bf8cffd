//! The sensor's JSON attributes payload.

use serde::Serialize;

use crate::state::{PerfSample, StatusSnapshot};

/// Auxiliary stats published on the sensor's attributes topic.
///
/// The field set is the wire contract: booleans for the output signals plus
/// the studio's performance counters. The replay-buffer flag is sampled but
/// deliberately not part of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorAttributes {
    pub recording: bool,
    pub streaming: bool,
    pub virtual_camera: bool,
    pub paused: bool,
    pub fps: f64,
    pub frame_time_ns: u64,
    pub frames: u64,
    pub lagged_frames: u64,
}

impl SensorAttributes {
    #[must_use]
    pub fn new(status: &StatusSnapshot, perf: &PerfSample) -> Self {
        Self {
            recording: status.recording,
            streaming: status.streaming,
            virtual_camera: status.virtual_camera,
            paused: status.paused,
            fps: perf.fps,
            frame_time_ns: perf.frame_time_ns,
            frames: perf.frames,
            lagged_frames: perf.lagged_frames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_the_full_field_set() {
        let status = StatusSnapshot {
            recording: true,
            streaming: false,
            virtual_camera: false,
            paused: true,
            replay_buffer: true,
        };
        let perf = PerfSample {
            fps: 29.97,
            frame_time_ns: 1_500_000,
            frames: 4200,
            lagged_frames: 3,
        };

        let json = serde_json::to_value(SensorAttributes::new(&status, &perf)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "recording": true,
                "streaming": false,
                "virtual_camera": false,
                "paused": true,
                "fps": 29.97,
                "frame_time_ns": 1_500_000,
                "frames": 4200,
                "lagged_frames": 3,
            })
        );
    }

    #[test]
    fn should_not_expose_the_replay_buffer_flag() {
        let status = StatusSnapshot {
            replay_buffer: true,
            ..StatusSnapshot::default()
        };
        let json = serde_json::to_value(SensorAttributes::new(&status, &PerfSample::default()))
            .unwrap();
        assert!(json.get("replay_buffer").is_none());
    }
}
