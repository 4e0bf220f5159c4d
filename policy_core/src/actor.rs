//! Collaborator surfaces the host simulation exposes to the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::PolicyId;

/// Opaque stable identity for a simulated entity. The engine never interprets
/// the contents; it is only a map key, and it must stay stable for the
/// lifetime of the owning world.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for EntityKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Per-entity surface the engine needs from the host simulation: identity,
/// eligibility, the transient live policy value, and context queries.
pub trait PolicyActor {
    fn key(&self) -> &EntityKey;

    /// Display label, used for operator-facing diagnostics only.
    fn label(&self) -> &str;

    /// Whether this entity is the kind that carries provisioning policies.
    fn is_personlike(&self) -> bool;

    /// The policy currently in effect in the simulation, if any.
    fn live_policy(&self) -> Option<PolicyId>;

    fn set_live_policy(&mut self, id: PolicyId);

    /// Entity is currently traveling with a convoy.
    fn in_travel_group(&self) -> bool;

    /// Entity currently resides at a home settlement.
    fn at_home(&self) -> bool;
}

/// Outbound notification that the engine rewrote a live value underneath the
/// host, so dependent aggregates (e.g. convoy provision totals) can be
/// invalidated.
pub trait LiveValueObserver {
    fn live_policy_changed(&mut self, key: &EntityKey);
}

/// Observer for hosts with no dependent aggregates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl LiveValueObserver for NullObserver {
    fn live_policy_changed(&mut self, _key: &EntityKey) {}
}

/// One line of a convoy transfer manifest: an entity plus how much of it the
/// operator has actually included.
#[derive(Debug)]
pub struct TransferItem<E> {
    pub entity: E,
    pub quantity: u32,
    /// Already counted as a member of the destination convoy.
    pub already_aboard: bool,
}

impl<E: PolicyActor> TransferItem<E> {
    pub fn new(entity: E, quantity: u32) -> Self {
        Self {
            entity,
            quantity,
            already_aboard: false,
        }
    }

    pub(crate) fn eligible_for_override(&self) -> bool {
        self.entity.is_personlike() && !self.already_aboard && self.quantity > 0
    }
}
