use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::claims::{Claim, PERMISSION_CLAIM};

/// Fine-grained admin permission, carried as a `permission` claim.
///
/// Permissions are opaque strings (e.g. "assign-role"). There is no wildcard:
/// every guarded admin action names the exact permission it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Grant or revoke marketplace roles on other users.
    pub const ASSIGN_ROLE: Permission = Permission(Cow::Borrowed("assign-role"));
    /// Attach or remove claims on other users.
    pub const ASSIGN_CLAIM: Permission = Permission(Cow::Borrowed("assign-claim"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_claim(&self) -> Claim {
        Claim::new(PERMISSION_CLAIM, self.as_str())
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Permission> for Claim {
    fn from(value: Permission) -> Self {
        value.to_claim()
    }
}
