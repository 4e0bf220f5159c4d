//! Provisioning-policy catalog: the ordered set of policies an operator can
//! assign, with a designated default.
//!
//! The catalog is owned by the host simulation; the engine only resolves ids
//! and labels against it. `PolicyRegistry` is a plain table-backed
//! implementation loaded from `provision_policies.json`, with support for an
//! environment variable override.

use std::{
    env, fmt, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BUILTIN_POLICY_CATALOG: &str = include_str!("data/provision_policies.json");

/// Identifier for a provisioning policy. Stable across saves; the primary
/// persistence key since layout v2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyId(pub u32);

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selectable provisioning policy. The label is display-only: operators
/// can rename or duplicate it, so it must never be used as a persistence key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub label: String,
}

impl Policy {
    pub fn new(id: PolicyId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// Read surface the engine needs from the host's policy catalog.
pub trait PolicyCatalog {
    /// Ordered list of selectable policies.
    fn policies(&self) -> &[Policy];

    /// Policy applied when an entity has no usable stored preference.
    fn default_policy(&self) -> &Policy;

    fn policy_by_id(&self, id: PolicyId) -> Option<&Policy> {
        self.policies().iter().find(|policy| policy.id == id)
    }

    /// First match in catalog order. Labels are not guaranteed unique; only
    /// legacy-save migration resolves by label.
    fn policy_by_label(&self, label: &str) -> Option<&Policy> {
        self.policies().iter().find(|policy| policy.label == label)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PolicyCatalogData {
    default_id: u32,
    policies: Vec<Policy>,
}

/// Table-backed [`PolicyCatalog`] used by tests and simple hosts.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: Vec<Policy>,
    default_index: usize,
}

impl PolicyRegistry {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            Self::from_json_str(BUILTIN_POLICY_CATALOG)
                .expect("builtin policy catalog should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let data: PolicyCatalogData = serde_json::from_str(json)?;
        Self::from_parts(data.policies, PolicyId(data.default_id))
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_parts(policies: Vec<Policy>, default_id: PolicyId) -> Result<Self, CatalogError> {
        if policies.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (index, policy) in policies.iter().enumerate() {
            if policies[..index].iter().any(|other| other.id == policy.id) {
                return Err(CatalogError::DuplicateId(policy.id));
            }
        }
        let default_index = policies
            .iter()
            .position(|policy| policy.id == default_id)
            .ok_or(CatalogError::UnknownDefault(default_id))?;
        Ok(Self {
            policies,
            default_index,
        })
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl PolicyCatalog for PolicyRegistry {
    fn policies(&self) -> &[Policy] {
        &self.policies
    }

    fn default_policy(&self) -> &Policy {
        &self.policies[self.default_index]
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse policy catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read policy catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("policy catalog must contain at least one policy")]
    Empty,
    #[error("default policy {0} is not in the catalog")]
    UnknownDefault(PolicyId),
    #[error("duplicate policy id {0} in catalog")]
    DuplicateId(PolicyId),
}

/// Load the policy catalog from environment or the builtin table.
pub fn load_policy_catalog_from_env() -> Arc<PolicyRegistry> {
    let override_path = env::var("POLICY_CATALOG_PATH").ok().map(PathBuf::from);

    if let Some(path) = override_path {
        match PolicyRegistry::from_file(&path) {
            Ok(registry) => {
                tracing::info!(
                    target: "longhaul::config",
                    path = %path.display(),
                    "policy_catalog.loaded=file"
                );
                return Arc::new(registry);
            }
            Err(err) => {
                tracing::warn!(
                    target: "longhaul::config",
                    path = %path.display(),
                    error = %err,
                    "policy_catalog.load_failed"
                );
            }
        }
    }

    let registry = PolicyRegistry::builtin();
    tracing::info!(target: "longhaul::config", "policy_catalog.loaded=builtin");
    registry
}
