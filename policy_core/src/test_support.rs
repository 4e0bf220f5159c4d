//! Shared fixtures for the unit tests in this crate.

use crate::actor::{EntityKey, PolicyActor};
use crate::catalog::{PolicyId, PolicyRegistry};

/// Catalog with the builtin policy set: Lavish (default, id 0) through
/// Nothing (id 5).
pub(crate) fn catalog() -> PolicyRegistry {
    PolicyRegistry::from_json_str(crate::catalog::BUILTIN_POLICY_CATALOG)
        .expect("builtin policy catalog should parse")
}

#[derive(Debug, Clone)]
pub(crate) struct TestActor {
    pub key: EntityKey,
    pub label: String,
    pub personlike: bool,
    pub live: Option<PolicyId>,
    pub traveling: bool,
    pub home_ctx: bool,
}

impl TestActor {
    pub fn new(key: &str, live: Option<PolicyId>) -> Self {
        Self {
            key: EntityKey::new(key),
            label: key.to_string(),
            personlike: true,
            live,
            traveling: false,
            home_ctx: false,
        }
    }
}

impl PolicyActor for TestActor {
    fn key(&self) -> &EntityKey {
        &self.key
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_personlike(&self) -> bool {
        self.personlike
    }

    fn live_policy(&self) -> Option<PolicyId> {
        self.live
    }

    fn set_live_policy(&mut self, id: PolicyId) {
        self.live = Some(id);
    }

    fn in_travel_group(&self) -> bool {
        self.traveling
    }

    fn at_home(&self) -> bool {
        self.home_ctx
    }
}
