//! Persisted data contracts for the Longhaul provisioning-policy ledger.
//!
//! Defines the on-save layout of the policy ledger record, including the
//! legacy label-keyed shape that pre-`version` saves carry, plus codec
//! helpers. The engine crate (`policy_core`) owns the semantics; this crate
//! only describes what goes into a save file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Current layout version of the policy ledger record.
pub const SCHEMA_VERSION: u32 = 2;

/// Version implied by payloads written before the `version` field existed.
/// Those saves carry label-keyed entries under the `retained_*` field names.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// One stored slot assignment: entity identity to policy id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SlotEntryState {
    pub entity_key: String,
    pub policy_id: u32,
}

/// Legacy v1 slot assignment, keyed by the policy's display label. Labels
/// are neither unique nor stable, which is why v2 switched to ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LegacySlotEntryState {
    pub entity_key: String,
    pub policy_label: String,
}

/// The persisted policy ledger record.
///
/// The legacy fields use names distinct from the current ones, so a single
/// decode pass reads either shape without ambiguity: a v1 payload populates
/// `retained_home_labels`/`retained_travel_labels` and defaults `version`
/// to [`LEGACY_SCHEMA_VERSION`]; a v2 payload populates `home`/`travel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyLedgerState {
    #[serde(default = "legacy_version")]
    pub version: u32,
    #[serde(default)]
    pub home: Vec<SlotEntryState>,
    #[serde(default)]
    pub travel: Vec<SlotEntryState>,
    #[serde(default)]
    pub retained_home_labels: Vec<LegacySlotEntryState>,
    #[serde(default)]
    pub retained_travel_labels: Vec<LegacySlotEntryState>,
}

fn legacy_version() -> u32 {
    LEGACY_SCHEMA_VERSION
}

impl PolicyLedgerState {
    /// Empty record at the current layout version.
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION,
            home: Vec::new(),
            travel: Vec::new(),
            retained_home_labels: Vec::new(),
            retained_travel_labels: Vec::new(),
        }
    }

    pub fn is_current(&self) -> bool {
        self.version >= SCHEMA_VERSION
    }

    pub fn has_legacy_entries(&self) -> bool {
        !self.retained_home_labels.is_empty() || !self.retained_travel_labels.is_empty()
    }
}

impl Default for PolicyLedgerState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn encode_ledger(state: &PolicyLedgerState) -> bincode::Result<Vec<u8>> {
    bincode::serialize(state)
}

pub fn decode_ledger(data: &[u8]) -> bincode::Result<PolicyLedgerState> {
    bincode::deserialize(data)
}

pub fn encode_ledger_json(state: &PolicyLedgerState) -> serde_json::Result<String> {
    serde_json::to_string(state)
}

pub fn decode_ledger_json(data: &str) -> serde_json::Result<PolicyLedgerState> {
    serde_json::from_str(data)
}
