//! Sequential schema migrations for persisted policy ledgers.
//!
//! The pipeline is an ordered list of `(target_version, step)` pairs applied
//! while the ledger's version is below the target. A failing step is caught
//! and logged with its target version and does not advance the version past
//! itself, but later steps still run best-effort. Loading an
//! already-current ledger runs zero steps.

use policy_schema::{LegacySlotEntryState, PolicyLedgerState, SCHEMA_VERSION};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::actor::EntityKey;
use crate::catalog::PolicyCatalog;
use crate::ledger::{PolicyLedger, PolicySlot};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("legacy payload is malformed: {0}")]
    MalformedLegacyPayload(String),
}

type MigrationFn =
    fn(&mut PolicyLedger, &PolicyLedgerState, &dyn PolicyCatalog) -> Result<(), MigrationError>;

struct MigrationStep {
    target: u32,
    run: MigrationFn,
}

const PIPELINE: &[MigrationStep] = &[MigrationStep {
    target: SCHEMA_VERSION,
    run: migrate_labels_to_ids,
}];

pub(crate) fn run_pipeline(
    ledger: &mut PolicyLedger,
    state: &PolicyLedgerState,
    catalog: &dyn PolicyCatalog,
) {
    run_steps(PIPELINE, ledger, state, catalog);
}

fn run_steps(
    steps: &[MigrationStep],
    ledger: &mut PolicyLedger,
    state: &PolicyLedgerState,
    catalog: &dyn PolicyCatalog,
) {
    let initial = ledger.version();
    for step in steps {
        if ledger.version() >= step.target {
            continue;
        }
        match (step.run)(ledger, state, catalog) {
            Ok(()) => ledger.set_version(step.target),
            Err(err) => {
                warn!(
                    "Policy ledger migration to v{} failed: {}. Continuing with later steps.",
                    step.target, err
                );
            }
        }
    }
    if ledger.version() != initial {
        info!(
            "Policy ledger migrated from v{} to v{}.",
            initial,
            ledger.version()
        );
    }
}

/// v1 -> v2: translate label-keyed legacy entries into id-keyed entries.
///
/// Labels are resolved against the live catalog in catalog order. An entry
/// whose label no longer resolves is dropped; labels are neither unique nor
/// stable, so dropping is the safest lossy behavior. Entries already present
/// in the current shape win over legacy ones.
fn migrate_labels_to_ids(
    ledger: &mut PolicyLedger,
    state: &PolicyLedgerState,
    catalog: &dyn PolicyCatalog,
) -> Result<(), MigrationError> {
    translate_legacy_entries(ledger, &state.retained_home_labels, PolicySlot::Home, catalog);
    translate_legacy_entries(
        ledger,
        &state.retained_travel_labels,
        PolicySlot::Travel,
        catalog,
    );
    Ok(())
}

fn translate_legacy_entries(
    ledger: &mut PolicyLedger,
    entries: &[LegacySlotEntryState],
    slot: PolicySlot,
    catalog: &dyn PolicyCatalog,
) {
    for entry in entries {
        let key = EntityKey::new(entry.entity_key.clone());
        if ledger.stored(&key, slot).is_some() {
            continue;
        }
        match catalog.policy_by_label(&entry.policy_label) {
            Some(policy) => ledger.set(key, slot, policy.id),
            None => debug!(
                "Dropped legacy {} entry for '{}': no policy labelled '{}'.",
                slot.as_str(),
                entry.entity_key,
                entry.policy_label
            ),
        }
    }
}
