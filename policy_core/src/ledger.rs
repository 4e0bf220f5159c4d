//! World-lifetime store of per-entity Home/Travel policy preferences.
//!
//! One `PolicyLedger` exists per simulation world. It is loaded from the
//! save file at world load (running schema migration when the persisted
//! layout is older than [`policy_schema::SCHEMA_VERSION`]), mutated through
//! the session, and flushed back at world save. Entries for entities that
//! have left the world are retained indefinitely; the ids are small and no
//! GC path exists.

use std::collections::HashMap;

use policy_schema::{PolicyLedgerState, SlotEntryState, SCHEMA_VERSION};
use thiserror::Error;

use crate::actor::EntityKey;
use crate::catalog::{PolicyCatalog, PolicyId};
use crate::migrate;

/// One of the two persisted preference categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicySlot {
    Home,
    Travel,
}

impl PolicySlot {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PolicySlot::Home => "home",
            PolicySlot::Travel => "travel",
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerCodecError {
    #[error("policy ledger payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("failed to decode policy ledger: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode policy ledger: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyLedger {
    version: u32,
    home: HashMap<EntityKey, PolicyId>,
    travel: HashMap<EntityKey, PolicyId>,
}

impl Default for PolicyLedger {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            home: HashMap::new(),
            travel: HashMap::new(),
        }
    }
}

impl PolicyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub(crate) fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    pub fn stored(&self, key: &EntityKey, slot: PolicySlot) -> Option<PolicyId> {
        self.entries(slot).get(key).copied()
    }

    /// Unconditional overwrite; an explicit operator action always wins over
    /// any existing stored value.
    pub fn set(&mut self, key: EntityKey, slot: PolicySlot, id: PolicyId) {
        self.entries_mut(slot).insert(key, id);
    }

    pub fn entry_count(&self, slot: PolicySlot) -> usize {
        self.entries(slot).len()
    }

    fn entries(&self, slot: PolicySlot) -> &HashMap<EntityKey, PolicyId> {
        match slot {
            PolicySlot::Home => &self.home,
            PolicySlot::Travel => &self.travel,
        }
    }

    fn entries_mut(&mut self, slot: PolicySlot) -> &mut HashMap<EntityKey, PolicyId> {
        match slot {
            PolicySlot::Home => &mut self.home,
            PolicySlot::Travel => &mut self.travel,
        }
    }

    /// Decode a persisted record and bring it up to the current layout.
    /// Decode failure is the only hard error; migration-step failures are
    /// caught and logged inside the pipeline.
    pub fn load(data: &[u8], catalog: &dyn PolicyCatalog) -> Result<Self, LedgerCodecError> {
        let text = std::str::from_utf8(data)?;
        let state = policy_schema::decode_ledger_json(text).map_err(LedgerCodecError::Decode)?;
        Ok(Self::from_state(state, catalog))
    }

    pub fn save(&self) -> Result<Vec<u8>, LedgerCodecError> {
        policy_schema::encode_ledger_json(&self.to_state())
            .map(String::into_bytes)
            .map_err(LedgerCodecError::Encode)
    }

    /// Build a ledger from a decoded record, running the migration pipeline.
    /// A record already at the current version passes through untouched.
    pub fn from_state(state: PolicyLedgerState, catalog: &dyn PolicyCatalog) -> Self {
        let mut ledger = Self {
            version: state.version,
            home: collect_entries(&state.home),
            travel: collect_entries(&state.travel),
        };
        migrate::run_pipeline(&mut ledger, &state, catalog);
        ledger
    }

    /// Current-layout record, entries sorted by entity key so save output is
    /// deterministic.
    pub fn to_state(&self) -> PolicyLedgerState {
        let mut state = PolicyLedgerState::new();
        state.version = self.version.max(SCHEMA_VERSION);
        state.home = sorted_entries(&self.home);
        state.travel = sorted_entries(&self.travel);
        state
    }
}

fn collect_entries(entries: &[SlotEntryState]) -> HashMap<EntityKey, PolicyId> {
    entries
        .iter()
        .map(|entry| {
            (
                EntityKey::new(entry.entity_key.clone()),
                PolicyId(entry.policy_id),
            )
        })
        .collect()
}

fn sorted_entries(entries: &HashMap<EntityKey, PolicyId>) -> Vec<SlotEntryState> {
    let mut states: Vec<SlotEntryState> = entries
        .iter()
        .map(|(key, id)| SlotEntryState {
            entity_key: key.as_str().to_string(),
            policy_id: id.0,
        })
        .collect();
    states.sort_unstable_by(|a, b| a.entity_key.cmp(&b.entity_key));
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::catalog;

    fn key(raw: &str) -> EntityKey {
        EntityKey::new(raw)
    }

    #[test]
    fn slots_are_independent() {
        let mut ledger = PolicyLedger::new();
        ledger.set(key("E1"), PolicySlot::Home, PolicyId(1));
        ledger.set(key("E1"), PolicySlot::Travel, PolicyId(2));

        assert_eq!(ledger.stored(&key("E1"), PolicySlot::Home), Some(PolicyId(1)));
        assert_eq!(
            ledger.stored(&key("E1"), PolicySlot::Travel),
            Some(PolicyId(2))
        );
        assert_eq!(ledger.stored(&key("E2"), PolicySlot::Home), None);
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let mut ledger = PolicyLedger::new();
        ledger.set(key("E1"), PolicySlot::Travel, PolicyId(1));
        ledger.set(key("E1"), PolicySlot::Travel, PolicyId(4));
        assert_eq!(
            ledger.stored(&key("E1"), PolicySlot::Travel),
            Some(PolicyId(4))
        );
        assert_eq!(ledger.entry_count(PolicySlot::Travel), 1);
    }

    #[test]
    fn save_load_round_trip_is_identity() {
        let registry = catalog();
        let mut ledger = PolicyLedger::new();
        ledger.set(key("E2"), PolicySlot::Home, PolicyId(0));
        ledger.set(key("E1"), PolicySlot::Home, PolicyId(3));
        ledger.set(key("E1"), PolicySlot::Travel, PolicyId(2));

        let bytes = ledger.save().expect("save");
        let reloaded = PolicyLedger::load(&bytes, &registry).expect("load");

        assert_eq!(reloaded, ledger);
        assert_eq!(reloaded.version(), SCHEMA_VERSION);
    }

    #[test]
    fn save_output_is_sorted_by_entity_key() {
        let mut ledger = PolicyLedger::new();
        ledger.set(key("zeta"), PolicySlot::Home, PolicyId(1));
        ledger.set(key("alpha"), PolicySlot::Home, PolicyId(2));
        ledger.set(key("mid"), PolicySlot::Home, PolicyId(3));

        let state = ledger.to_state();
        let keys: Vec<&str> = state.home.iter().map(|e| e.entity_key.as_str()).collect();
        assert_eq!(keys, vec!["alpha", "mid", "zeta"]);

        // deterministic output: two saves of the same ledger are identical
        assert_eq!(ledger.save().unwrap(), ledger.save().unwrap());
    }

    #[test]
    fn load_rejects_malformed_payload() {
        let registry = catalog();
        let err = PolicyLedger::load(b"{ not json", &registry).unwrap_err();
        assert!(matches!(err, LedgerCodecError::Decode(_)));
    }
}
