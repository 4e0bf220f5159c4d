//! Transient application of Travel policies during bracketed host operations.
//!
//! Convoy cost estimation needs every eligible entity to behave as if its
//! Travel policy were live, without permanently changing anything. The
//! override is a scoped resource: [`TravelOverride::begin`] swaps the live
//! values in and the guard's `Drop` swaps them back on every exit path,
//! including unwind.
//!
//! The guard itself is cheap but not free. Hosts that recompute behind a
//! dirty flag must check that flag BEFORE calling `begin`; a cached
//! computation must never enter the override machinery at all.

use crate::actor::{PolicyActor, TransferItem};
use crate::catalog::{PolicyCatalog, PolicyId};
use crate::ledger::PolicyLedger;
use crate::resolver::effective_travel_policy;

/// Live-value override over a convoy transfer manifest, restored on drop.
pub struct TravelOverride<'a, E: PolicyActor> {
    items: &'a mut [TransferItem<E>],
    originals: Vec<(usize, PolicyId)>,
}

impl<'a, E: PolicyActor> TravelOverride<'a, E> {
    /// Swap each eligible entity's live policy for its effective Travel
    /// policy, remembering the original. Eligible means: personlike, not
    /// already aboard the destination convoy, and included with a positive
    /// quantity. With zero eligible entries the guard is an empty no-op.
    pub fn begin(
        items: &'a mut [TransferItem<E>],
        ledger: &PolicyLedger,
        catalog: &impl PolicyCatalog,
    ) -> Self {
        let mut originals = Vec::new();
        for (index, item) in items.iter_mut().enumerate() {
            if !item.eligible_for_override() {
                continue;
            }
            let Some(original) = item.entity.live_policy() else {
                continue;
            };
            let travel = effective_travel_policy(ledger, catalog, item.entity.key()).id;
            originals.push((index, original));
            item.entity.set_live_policy(travel);
        }
        Self { items, originals }
    }

    /// The manifest as the bracketed operation sees it, overrides applied.
    pub fn items(&self) -> &[TransferItem<E>] {
        self.items
    }

    pub fn items_mut(&mut self) -> &mut [TransferItem<E>] {
        self.items
    }

    pub fn overridden_count(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }
}

impl<E: PolicyActor> Drop for TravelOverride<'_, E> {
    fn drop(&mut self) {
        // unconditional restore; this must also run when the bracketed
        // operation unwinds
        for (index, original) in self.originals.drain(..) {
            self.items[index].entity.set_live_policy(original);
        }
    }
}

/// Run `op` over the manifest with Travel policies applied, restoring the
/// original live values afterwards regardless of how `op` exits.
pub fn with_travel_overrides<E, C, R>(
    items: &mut [TransferItem<E>],
    ledger: &PolicyLedger,
    catalog: &C,
    op: impl FnOnce(&[TransferItem<E>]) -> R,
) -> R
where
    E: PolicyActor,
    C: PolicyCatalog,
{
    let guard = TravelOverride::begin(items, ledger, catalog);
    op(guard.items())
}
