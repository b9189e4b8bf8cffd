//! Studio lifecycle events — discrete notifications emitted by the host
//! application and consumed by the bridge's coordination loop.

/// A lifecycle notification from the studio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioEvent {
    /// The current profile changed (the new profile is queried, not carried,
    /// so a late event still resolves against fresh state).
    ProfileChanged,
    /// The set of available profiles changed; the profile entities must be
    /// rebuilt wholesale.
    ProfileListChanged,
    RecordingStarted,
    RecordingStopped,
    StreamingStarted,
    StreamingStopped,
    VirtualCameraStarted,
    VirtualCameraStopped,
}

impl StudioEvent {
    /// Whether this event marks an output turning on.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(
            self,
            Self::RecordingStarted | Self::StreamingStarted | Self::VirtualCameraStarted
        )
    }
}
