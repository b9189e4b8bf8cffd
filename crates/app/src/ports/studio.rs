//! Studio port — status queries and control calls against the host
//! media-production application.
//!
//! Lifecycle notifications do not flow through this trait: the studio
//! adapter emits [`StudioEvent`](castbridge_domain::event::StudioEvent)s
//! over a channel drained by the coordination loop.

use std::future::Future;

use castbridge_domain::error::BridgeError;
use castbridge_domain::state::{PerfSample, StatusSnapshot};

/// The host application's native state-query and control API.
///
/// Start/stop calls carry no success result beyond transport-level errors:
/// the authoritative outcome arrives later as a lifecycle event. Redundant
/// start/stop calls (e.g. starting a recording that is already running)
/// are treated as no-ops by implementations.
pub trait Studio: Send + Sync {
    /// Sample the current boolean output signals.
    fn status(&self) -> impl Future<Output = Result<StatusSnapshot, BridgeError>> + Send;

    /// Sample the performance counters.
    fn perf(&self) -> impl Future<Output = Result<PerfSample, BridgeError>> + Send;

    /// Name of the currently active profile.
    fn current_profile(&self) -> impl Future<Output = Result<String, BridgeError>> + Send;

    /// All available profile names, in the studio's own order.
    fn list_profiles(&self) -> impl Future<Output = Result<Vec<String>, BridgeError>> + Send;

    /// Switch to the named profile.
    fn set_current_profile(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    fn start_recording(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;
    fn stop_recording(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;
    fn start_streaming(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;
    fn stop_streaming(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;
    fn start_virtual_camera(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;
    fn stop_virtual_camera(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;
}
