use serde::{Deserialize, Serialize};
use tutorhub_core::{DomainError, DomainResult};

use crate::{Claim, Permission, Role};

/// Tag identifying which handlers can evaluate a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Claim,
    Threshold,
}

impl RequirementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementKind::Claim => "claim",
            RequirementKind::Threshold => "threshold",
        }
    }
}

impl core::fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative condition checked against a principal.
///
/// Serialized with an internal `kind` tag; an unknown tag or an unknown
/// field fails to deserialize, so misconfigured policies never reach
/// evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Requirement {
    /// Satisfied iff the principal holds exactly `(claim_type, claim_value)`.
    Claim {
        claim_type: String,
        claim_value: String,
    },

    /// A derived numeric fact about the principal (e.g. admin tenure in
    /// days) must reach `threshold_value`.
    ///
    /// No handler ships for this kind. Policies using it are rejected at
    /// registration unless the caller registers one.
    Threshold {
        metric_name: String,
        threshold_value: i64,
    },
}

impl Requirement {
    pub fn claim(claim_type: impl Into<String>, claim_value: impl Into<String>) -> Self {
        Self::Claim {
            claim_type: claim_type.into(),
            claim_value: claim_value.into(),
        }
    }

    pub fn role(role: &Role) -> Self {
        role.to_claim().into()
    }

    pub fn permission(permission: &Permission) -> Self {
        permission.to_claim().into()
    }

    pub fn threshold(metric_name: impl Into<String>, threshold_value: i64) -> Self {
        Self::Threshold {
            metric_name: metric_name.into(),
            threshold_value,
        }
    }

    /// Reject blank claim types, values and metric names.
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            Requirement::Claim {
                claim_type,
                claim_value,
            } => {
                if claim_type.trim().is_empty() {
                    return Err(DomainError::validation("claim type must not be blank"));
                }
                if claim_value.trim().is_empty() {
                    return Err(DomainError::validation(format!(
                        "claim '{claim_type}' must have a non-blank value"
                    )));
                }
            }
            Requirement::Threshold { metric_name, .. } => {
                if metric_name.trim().is_empty() {
                    return Err(DomainError::validation("metric name must not be blank"));
                }
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> RequirementKind {
        match self {
            Requirement::Claim { .. } => RequirementKind::Claim,
            Requirement::Threshold { .. } => RequirementKind::Threshold,
        }
    }
}

impl From<Claim> for Requirement {
    fn from(value: Claim) -> Self {
        Self::Claim {
            claim_type: value.claim_type,
            claim_value: value.claim_value,
        }
    }
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Requirement::Claim {
                claim_type,
                claim_value,
            } => write!(f, "claim {claim_type}={claim_value}"),
            Requirement::Threshold {
                metric_name,
                threshold_value,
            } => write!(f, "threshold {metric_name}>={threshold_value}"),
        }
    }
}
