//! # castbridge-domain
//!
//! Pure domain model for the castbridge studio-to-Home-Assistant bridge.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, switch kinds, payload strings
//! - Define the **sensor state machine** (status snapshot → discrete state,
//!   with previous-state tracking for edge detection)
//! - Define the **MQTT topic namespace** (pure derivation + reverse lookup)
//! - Define the **Home Assistant discovery schema** (config payloads and
//!   the shared device identity block)
//! - Define the sensor's JSON attributes payload
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod attributes;
pub mod discovery;
pub mod error;
pub mod event;
pub mod state;
pub mod switch;
pub mod topic;
