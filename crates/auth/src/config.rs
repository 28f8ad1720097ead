//! Policy configuration loaded at startup.
//!
//! ```json
//! {
//!   "policies": [
//!     { "name": "admin-only",
//!       "requirements": [{ "kind": "claim", "claim_type": "role", "claim_value": "admin" }] }
//!   ],
//!   "actions": { "tutors.verify": "admin-only" }
//! }
//! ```
//!
//! Everything is validated while building the guard; any problem is an
//! [`AuthzError`] that should abort startup.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ActionGuard, AuthzError, HandlerRegistry, Policy, PolicyRegistry};

/// Environment variable naming a JSON access-config file.
pub const ACCESS_CONFIG_ENV: &str = "TUTORHUB_ACCESS_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessConfig {
    #[serde(default)]
    pub policies: Vec<Policy>,
    /// action name -> policy name
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
}

impl AccessConfig {
    pub fn from_json(json: &str) -> Result<Self, AuthzError> {
        serde_json::from_str(json)
            .map_err(|e| AuthzError::Configuration(format!("invalid access config: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read access config at {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("unable to parse access config at {}", path.display()))?;
        Ok(config)
    }

    /// Load from the file named by [`ACCESS_CONFIG_ENV`], if set.
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        match std::env::var(ACCESS_CONFIG_ENV) {
            Ok(path) => Self::load(path).map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(e).context(ACCESS_CONFIG_ENV),
        }
    }

    /// Register every policy and bind every action, failing on the first
    /// problem.
    pub fn build(self, handlers: HandlerRegistry) -> Result<ActionGuard, AuthzError> {
        let mut registry = PolicyRegistry::new(handlers);
        registry.register_all(self.policies)?;

        let mut guard = ActionGuard::new(registry);
        for (action, policy) in self.actions {
            guard.bind(action, policy)?;
        }

        info!(
            policies = guard.registry().names().count(),
            actions = guard.actions().count(),
            "access config loaded"
        );
        Ok(guard)
    }
}
