use serde::{Deserialize, Serialize};

use crate::Requirement;

/// A named, ordered set of requirements that must all pass.
///
/// Order carries no meaning for the decision; it is kept so that audit
/// output reads the way the policy was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    pub name: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

impl Policy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
        }
    }

    pub fn with_requirements(
        name: impl Into<String>,
        requirements: impl IntoIterator<Item = Requirement>,
    ) -> Self {
        Self {
            name: name.into(),
            requirements: requirements.into_iter().collect(),
        }
    }

    pub fn require(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// A policy with no requirements allows every principal.
    pub fn is_unconstrained(&self) -> bool {
        self.requirements.is_empty()
    }
}
