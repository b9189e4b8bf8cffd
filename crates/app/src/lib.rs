//! # castbridge-app
//!
//! Application layer — the bridge orchestrator and **port definitions**
//! (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound
//!   ports):
//!   - `MqttPublisher` — publish/subscribe/disconnect primitives
//!   - `Studio` — status queries and control calls against the host
//!     application
//! - Define the **runtime entity model** (the discovered sensor and
//!   switches, their announce/retract publish sequences)
//! - Run the **coordination loop**: one task draining MQTT events, studio
//!   events, and the poll timer, so all mutable bridge state has a single
//!   writer
//! - Route inbound MQTT commands to the owning entity and execute them
//!
//! ## Dependency rule
//! Depends on `castbridge-domain` only (plus `tokio::sync`/`tokio::time`
//! for channels and timers). Never imports adapter crates. Adapters depend
//! on *this* crate, not the reverse.

pub mod entity;
pub mod ports;
pub mod router;
pub mod session;
