//! Command router — maps an inbound message's topic to the owning entity.
//!
//! Routing is a two-step lookup: the topic's family segment picks the
//! switch kind, then an exact command-topic match against the live registry
//! picks the instance. A miss is an expected condition (retained replays,
//! foreign traffic on overlapping trees) and resolves to `None`, which
//! callers treat as a silent no-op.

use castbridge_domain::switch::SwitchType;
use castbridge_domain::topic::command_topic_kind;

use crate::entity::{PersistentSwitches, ProfileRegistry, Switch};

/// Resolve an inbound command topic to the owning switch, if any.
#[must_use]
pub fn route<'a>(
    topic: &str,
    persistent: Option<&'a PersistentSwitches>,
    profiles: &'a ProfileRegistry,
) -> Option<&'a Switch> {
    match command_topic_kind(topic)? {
        SwitchType::Profile => profiles.find_by_command_topic(topic),
        kind => {
            let switch = persistent?.by_kind(kind)?;
            (switch.command_topic() == topic).then_some(switch)
        }
    }
}
