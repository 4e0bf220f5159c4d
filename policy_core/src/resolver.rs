//! Read/write façade resolving stored slot values against the live catalog.
//!
//! Stored ids are re-resolved on every read; a policy can disappear from the
//! catalog after its id was recorded. Travel falls back to the catalog
//! default, Home adopts the entity's live value as its baseline the first
//! time it is read.

use crate::actor::{EntityKey, PolicyActor};
use crate::catalog::{Policy, PolicyCatalog, PolicyId};
use crate::ledger::{PolicyLedger, PolicySlot};

/// Effective Travel policy: the stored policy when its id still resolves,
/// else the catalog default.
pub(crate) fn effective_travel_policy<'c>(
    ledger: &PolicyLedger,
    catalog: &'c dyn PolicyCatalog,
    key: &EntityKey,
) -> &'c Policy {
    ledger
        .stored(key, PolicySlot::Travel)
        .and_then(|id| catalog.policy_by_id(id))
        .unwrap_or_else(|| catalog.default_policy())
}

/// Resolve the Home slot, adopting the actor's live value as the recorded
/// baseline when nothing usable is stored. Returns `None` only when the
/// actor has no live value to adopt.
pub(crate) fn ensure_home_baseline(
    ledger: &mut PolicyLedger,
    catalog: &dyn PolicyCatalog,
    actor: &impl PolicyActor,
) -> Option<Policy> {
    if let Some(policy) = ledger
        .stored(actor.key(), PolicySlot::Home)
        .and_then(|id| catalog.policy_by_id(id))
    {
        return Some(policy.clone());
    }

    // First observation must never change the entity's visible behavior:
    // whatever is live right now becomes the recorded baseline.
    let live = actor.live_policy()?;
    ledger.set(actor.key().clone(), PolicySlot::Home, live);
    catalog.policy_by_id(live).cloned()
}

/// Borrowed read/write view over a ledger and the catalog it resolves
/// against. Stateless apart from the borrows; construct it where needed.
pub struct PolicyResolver<'a, C: PolicyCatalog> {
    ledger: &'a mut PolicyLedger,
    catalog: &'a C,
}

impl<'a, C: PolicyCatalog> PolicyResolver<'a, C> {
    pub fn new(ledger: &'a mut PolicyLedger, catalog: &'a C) -> Self {
        Self { ledger, catalog }
    }

    pub fn stored(&self, key: &EntityKey, slot: PolicySlot) -> Option<PolicyId> {
        self.ledger.stored(key, slot)
    }

    /// Effective Travel policy. An entity the engine has never touched is
    /// assumed fine with the catalog default.
    pub fn effective_travel(&self, key: &EntityKey) -> Policy {
        effective_travel_policy(self.ledger, self.catalog, key).clone()
    }

    /// Effective Home policy, initializing the slot from the actor's live
    /// value on first read. `None` when the actor has no live value.
    pub fn effective_home(&mut self, actor: &impl PolicyActor) -> Option<Policy> {
        ensure_home_baseline(self.ledger, self.catalog, actor)
    }

    /// Record an operator-driven update. Always overwrites, including a
    /// previously auto-initialized Home value.
    pub fn set_slot(&mut self, key: &EntityKey, slot: PolicySlot, id: PolicyId) {
        self.ledger.set(key.clone(), slot, id);
    }

    /// Stable sort key for operator tables ordered by stored Travel policy.
    pub fn travel_sort_key(&self, key: &EntityKey) -> u32 {
        effective_travel_policy(self.ledger, self.catalog, key).id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{catalog, TestActor};

    #[test]
    fn travel_falls_back_to_default_when_absent() {
        let registry = catalog();
        let mut ledger = PolicyLedger::new();
        let resolver = PolicyResolver::new(&mut ledger, &registry);

        let policy = resolver.effective_travel(&EntityKey::new("E1"));
        assert_eq!(policy.label, "Lavish");
        assert_eq!(policy.id, PolicyId(0));
    }

    #[test]
    fn travel_falls_back_to_default_when_unresolvable() {
        let registry = catalog();
        let mut ledger = PolicyLedger::new();
        ledger.set(EntityKey::new("E1"), PolicySlot::Travel, PolicyId(99));

        let resolver = PolicyResolver::new(&mut ledger, &registry);
        assert_eq!(
            resolver.effective_travel(&EntityKey::new("E1")).id,
            PolicyId(0)
        );
    }

    #[test]
    fn travel_returns_stored_policy_when_resolvable() {
        let registry = catalog();
        let mut ledger = PolicyLedger::new();
        ledger.set(EntityKey::new("E1"), PolicySlot::Travel, PolicyId(4));

        let resolver = PolicyResolver::new(&mut ledger, &registry);
        let policy = resolver.effective_travel(&EntityKey::new("E1"));
        assert_eq!(policy.label, "Ascetic");
    }

    #[test]
    fn home_initializes_from_live_value_once() {
        let registry = catalog();
        let mut ledger = PolicyLedger::new();
        let mut actor = TestActor::new("E1", Some(PolicyId(2)));

        let mut resolver = PolicyResolver::new(&mut ledger, &registry);
        let first = resolver.effective_home(&actor).expect("resolves");
        assert_eq!(first.id, PolicyId(2));

        // the live value moves on; the recorded baseline must not
        actor.live = Some(PolicyId(5));
        let second = resolver.effective_home(&actor).expect("resolves");
        assert_eq!(second.id, PolicyId(2));
    }

    #[test]
    fn home_reinitializes_when_stored_id_is_unresolvable() {
        let registry = catalog();
        let mut ledger = PolicyLedger::new();
        ledger.set(EntityKey::new("E1"), PolicySlot::Home, PolicyId(99));
        let actor = TestActor::new("E1", Some(PolicyId(1)));

        let mut resolver = PolicyResolver::new(&mut ledger, &registry);
        let policy = resolver.effective_home(&actor).expect("resolves");
        assert_eq!(policy.id, PolicyId(1));
        assert_eq!(
            resolver.stored(&EntityKey::new("E1"), PolicySlot::Home),
            Some(PolicyId(1))
        );
    }

    #[test]
    fn home_without_live_value_resolves_to_none() {
        let registry = catalog();
        let mut ledger = PolicyLedger::new();
        let actor = TestActor::new("E1", None);

        let mut resolver = PolicyResolver::new(&mut ledger, &registry);
        assert!(resolver.effective_home(&actor).is_none());
        assert_eq!(
            resolver.stored(&EntityKey::new("E1"), PolicySlot::Home),
            None
        );
    }

    #[test]
    fn set_slot_overwrites_auto_initialized_home() {
        let registry = catalog();
        let mut ledger = PolicyLedger::new();
        let actor = TestActor::new("E1", Some(PolicyId(2)));

        let mut resolver = PolicyResolver::new(&mut ledger, &registry);
        resolver.effective_home(&actor);
        resolver.set_slot(&EntityKey::new("E1"), PolicySlot::Home, PolicyId(4));

        assert_eq!(
            resolver.effective_home(&actor).expect("resolves").id,
            PolicyId(4)
        );
    }

    #[test]
    fn travel_sort_key_orders_by_stored_policy() {
        let registry = catalog();
        let mut ledger = PolicyLedger::new();
        ledger.set(EntityKey::new("E1"), PolicySlot::Travel, PolicyId(4));

        let resolver = PolicyResolver::new(&mut ledger, &registry);
        assert_eq!(resolver.travel_sort_key(&EntityKey::new("E1")), 4);
        // untouched entity sorts with the default
        assert_eq!(resolver.travel_sort_key(&EntityKey::new("E2")), 0);
    }
}
