//! Switch kinds and the canonical ON/OFF payload strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The family a switch entity belongs to.
///
/// The kind decides the entity's topic layout and command semantics. The
/// capability predicates replace a subclass hierarchy: `Profile` switches
/// are ephemeral (config not retained, retractable, no availability topic),
/// everything else is persistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchType {
    Profile,
    Record,
    Stream,
    VirtualCamera,
}

impl SwitchType {
    /// Topic-segment form of the kind (`profile`, `record`, `stream`,
    /// `virtual_camera`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Record => "record",
            Self::Stream => "stream",
            Self::VirtualCamera => "virtual_camera",
        }
    }

    /// Human-facing label used in discovery `name` fields.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "Profile",
            Self::Record => "Record",
            Self::Stream => "Stream",
            Self::VirtualCamera => "Virtual Camera",
        }
    }

    /// Whether entities of this kind advertise an availability topic.
    #[must_use]
    pub fn has_availability(self) -> bool {
        !matches!(self, Self::Profile)
    }

    /// Whether this kind's discovery config is published retained.
    #[must_use]
    pub fn is_retained(self) -> bool {
        !matches!(self, Self::Profile)
    }

    /// Whether entities of this kind are deleted by publishing an empty
    /// config payload (the Home Assistant retraction convention).
    #[must_use]
    pub fn is_retractable(self) -> bool {
        matches!(self, Self::Profile)
    }
}

impl fmt::Display for SwitchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a topic segment does not name a switch kind.
#[derive(Debug, thiserror::Error)]
#[error("unknown switch kind `{0}`")]
pub struct UnknownSwitchType(pub String);

impl FromStr for SwitchType {
    type Err = UnknownSwitchType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(Self::Profile),
            "record" => Ok(Self::Record),
            "stream" => Ok(Self::Stream),
            "virtual_camera" => Ok(Self::VirtualCamera),
            other => Err(UnknownSwitchType(other.to_string())),
        }
    }
}

/// Canonical MQTT payload strings for switch state and command traffic.
///
/// Home Assistant matches on exact string equality, so the wire form is
/// always the literal `ON` / `OFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchPayload {
    On,
    Off,
}

impl SwitchPayload {
    /// The exact wire string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    /// Map a boolean signal onto the payload pair.
    #[must_use]
    pub fn from_flag(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for SwitchPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an inbound payload is neither `ON` nor `OFF`.
#[derive(Debug, thiserror::Error)]
#[error("unknown switch payload `{0}`")]
pub struct UnknownSwitchPayload(pub String);

impl FromStr for SwitchPayload {
    type Err = UnknownSwitchPayload;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Case-sensitive on purpose: `on` is not a valid payload.
        match s {
            "ON" => Ok(Self::On),
            "OFF" => Ok(Self::Off),
            other => Err(UnknownSwitchPayload(other.to_string())),
        }
    }
}
