use tutorhub_core::UserId;

use crate::claims::ClaimSet;

/// The acting identity for one authorization check.
///
/// Claims are resolved upstream (token/session verification) and are
/// read-only from here on. An anonymous principal has no id and typically
/// an empty claim set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    id: Option<UserId>,
    claims: ClaimSet,
}

impl Principal {
    pub fn new(id: UserId, claims: ClaimSet) -> Self {
        Self {
            id: Some(id),
            claims,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A principal with claims but no resolved user id.
    pub fn from_claims(claims: ClaimSet) -> Self {
        Self { id: None, claims }
    }

    pub fn id(&self) -> Option<UserId> {
        self.id
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    pub fn has_claim(&self, claim_type: &str, claim_value: &str) -> bool {
        self.claims.has_claim(claim_type, claim_value)
    }
}
