use std::path::PathBuf;
use std::sync::Once;

use policy_core::{EntityKey, LiveValueObserver, PolicyActor, PolicyId, PolicyRegistry};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture_catalog() -> PolicyRegistry {
    PolicyRegistry::from_file(&fixture_path("policy_catalog.json"))
        .expect("fixture policy catalog should load")
}

/// Minimal host-side entity: a settler whose live policy the engine may
/// rewrite.
#[derive(Debug, Clone)]
pub struct FakeSettler {
    pub key: EntityKey,
    pub label: String,
    pub personlike: bool,
    pub live: Option<PolicyId>,
    pub traveling: bool,
    pub at_home: bool,
}

impl FakeSettler {
    pub fn new(name: &str, live: u32) -> Self {
        Self {
            key: EntityKey::new(name),
            label: name.to_string(),
            personlike: true,
            live: Some(PolicyId(live)),
            traveling: false,
            at_home: true,
        }
    }
}

impl PolicyActor for FakeSettler {
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
        self.at_home
    }
}

/// Host-side invalidation log: which entities had their live value rewritten
/// underneath the host.
#[derive(Debug, Default)]
pub struct InvalidationLog {
    pub keys: Vec<String>,
}

impl LiveValueObserver for InvalidationLog {
    fn live_policy_changed(&mut self, key: &EntityKey) {
        self.keys.push(key.as_str().to_string());
    }
}
