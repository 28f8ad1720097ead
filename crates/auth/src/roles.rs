use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::claims::{Claim, ROLE_CLAIM};

/// Marketplace role, carried on the principal as a `role` claim.
///
/// Roles are opaque strings at this layer; the well-known ones are provided
/// as constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const TUTOR: Role = Role(Cow::Borrowed("tutor"));
    pub const PARENT: Role = Role(Cow::Borrowed("parent"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_claim(&self) -> Claim {
        Claim::new(ROLE_CLAIM, self.as_str())
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Role> for Claim {
    fn from(value: Role) -> Self {
        value.to_claim()
    }
}
