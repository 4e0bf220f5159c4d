//! Convoy lifecycle callbacks from the host simulation.
//!
//! The host calls in when a convoy forms and when one arrives back at a home
//! settlement; the engine swaps each personlike member's live policy to the
//! slot that now applies and reports the outcome per entity. Failures are
//! logged and skipped; nothing here may take down the caller.

use tracing::{info, warn};

use crate::actor::{EntityKey, LiveValueObserver, PolicyActor};
use crate::catalog::{PolicyCatalog, PolicyId};
use crate::ledger::{PolicyLedger, PolicySlot};
use crate::resolver::{effective_travel_policy, ensure_home_baseline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Live policy updated to the given policy.
    Applied(PolicyId),
    /// No applicable policy could be determined; live value left untouched.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    pub key: EntityKey,
    pub outcome: TransitionOutcome,
}

/// A convoy has formed. For each personlike member: record the current live
/// value as the Home baseline (initialize-once; an existing usable Home
/// value is never overwritten), then apply the member's effective Travel
/// policy.
pub fn on_convoy_formed<E: PolicyActor>(
    ledger: &mut PolicyLedger,
    catalog: &dyn PolicyCatalog,
    actors: &mut [E],
    observer: &mut impl LiveValueObserver,
) -> Vec<TransitionReport> {
    let mut reports = Vec::new();
    for actor in actors.iter_mut() {
        if !actor.is_personlike() {
            continue;
        }

        // departure baseline; skipped silently when the host has no live
        // value for this entity
        ensure_home_baseline(ledger, catalog, actor);

        let travel = effective_travel_policy(ledger, catalog, actor.key()).clone();
        actor.set_live_policy(travel.id);
        observer.live_policy_changed(actor.key());
        info!(
            "'{}' departed with a convoy. Provisioning policy set to '{}'.",
            actor.label(),
            travel.label
        );
        reports.push(TransitionReport {
            key: actor.key().clone(),
            outcome: TransitionOutcome::Applied(travel.id),
        });
    }
    reports
}

/// A convoy has arrived at a home settlement. Each personlike member gets
/// its effective Home policy back; members the engine has never touched
/// adopt their current live value as the baseline, which leaves their
/// behavior visibly unchanged.
pub fn on_convoy_arrived_home<E: PolicyActor>(
    ledger: &mut PolicyLedger,
    catalog: &dyn PolicyCatalog,
    actors: &mut [E],
    observer: &mut impl LiveValueObserver,
) -> Vec<TransitionReport> {
    let mut reports = Vec::new();
    for actor in actors.iter_mut() {
        if !actor.is_personlike() {
            continue;
        }

        match ensure_home_baseline(ledger, catalog, actor) {
            Some(policy) => {
                actor.set_live_policy(policy.id);
                observer.live_policy_changed(actor.key());
                info!(
                    "'{}' returned home. Provisioning policy reset back to '{}'.",
                    actor.label(),
                    policy.label
                );
                reports.push(TransitionReport {
                    key: actor.key().clone(),
                    outcome: TransitionOutcome::Applied(policy.id),
                });
            }
            None => {
                warn!(
                    "Could not update provisioning policy for '{}'. Their current policy is '{}'.",
                    actor.label(),
                    describe_live_policy(catalog, actor)
                );
                reports.push(TransitionReport {
                    key: actor.key().clone(),
                    outcome: TransitionOutcome::Skipped,
                });
            }
        }
    }
    reports
}

fn describe_live_policy(catalog: &dyn PolicyCatalog, actor: &impl PolicyActor) -> String {
    actor
        .live_policy()
        .map(|id| match catalog.policy_by_id(id) {
            Some(policy) => policy.label.clone(),
            None => format!("#{id}"),
        })
        .unwrap_or_else(|| "none".to_string())
}
