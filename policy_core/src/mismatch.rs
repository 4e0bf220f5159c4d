//! Classification and resolution of stored-vs-live policy disagreement.
//!
//! A slot only has an opinion when the entity's context matches it: Home for
//! home residents, Travel for convoy travelers. A slot with no resolvable
//! stored value is never mismatched; absence is not disagreement.

use tracing::warn;

use crate::actor::{LiveValueObserver, PolicyActor};
use crate::catalog::PolicyCatalog;
use crate::ledger::{PolicyLedger, PolicySlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAlignment {
    /// Stored value resolves and equals the live value in a matching context.
    Match,
    /// Stored value resolves and differs from the live value in a matching
    /// context.
    Mismatch,
    /// No opinion: wrong context, nothing stored, or nothing resolvable.
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveDirection {
    /// Overwrite the live value with the stored value. The default
    /// interactive action.
    Pull,
    /// Adopt whatever is live right now as the new stored baseline.
    Push,
}

fn context_applies(actor: &impl PolicyActor, slot: PolicySlot) -> bool {
    match slot {
        PolicySlot::Home => actor.at_home(),
        PolicySlot::Travel => actor.in_travel_group(),
    }
}

pub fn classify(
    ledger: &PolicyLedger,
    catalog: &dyn PolicyCatalog,
    actor: &impl PolicyActor,
    slot: PolicySlot,
) -> SlotAlignment {
    if !context_applies(actor, slot) {
        return SlotAlignment::NotApplicable;
    }
    let Some(stored) = ledger.stored(actor.key(), slot) else {
        return SlotAlignment::NotApplicable;
    };
    if catalog.policy_by_id(stored).is_none() {
        return SlotAlignment::NotApplicable;
    }
    match actor.live_policy() {
        Some(live) if live == stored => SlotAlignment::Match,
        Some(_) => SlotAlignment::Mismatch,
        None => SlotAlignment::NotApplicable,
    }
}

pub fn is_match(
    ledger: &PolicyLedger,
    catalog: &dyn PolicyCatalog,
    actor: &impl PolicyActor,
    slot: PolicySlot,
) -> bool {
    classify(ledger, catalog, actor, slot) == SlotAlignment::Match
}

pub fn is_mismatch(
    ledger: &PolicyLedger,
    catalog: &dyn PolicyCatalog,
    actor: &impl PolicyActor,
    slot: PolicySlot,
) -> bool {
    classify(ledger, catalog, actor, slot) == SlotAlignment::Mismatch
}

/// Resolve a mismatch by pushing in the given direction. Returns whether
/// anything was applied; a failed resolution leaves the entity untouched.
pub fn resolve(
    ledger: &mut PolicyLedger,
    catalog: &dyn PolicyCatalog,
    actor: &mut impl PolicyActor,
    slot: PolicySlot,
    direction: ResolveDirection,
    observer: &mut impl LiveValueObserver,
) -> bool {
    match direction {
        ResolveDirection::Pull => {
            let stored = ledger
                .stored(actor.key(), slot)
                .and_then(|id| catalog.policy_by_id(id));
            let Some(policy) = stored else {
                warn!(
                    "Could not update provisioning policy for '{}'. No stored {} policy resolves.",
                    actor.label(),
                    slot.as_str()
                );
                return false;
            };
            let id = policy.id;
            actor.set_live_policy(id);
            observer.live_policy_changed(actor.key());
            true
        }
        ResolveDirection::Push => {
            let Some(live) = actor.live_policy() else {
                warn!(
                    "Could not adopt live policy for '{}': no live value.",
                    actor.label()
                );
                return false;
            };
            ledger.set(actor.key().clone(), slot, live);
            true
        }
    }
}
