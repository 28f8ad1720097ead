use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Claim type carrying the marketplace role (`admin`, `tutor`, `parent`).
pub const ROLE_CLAIM: &str = "role";

/// Claim type carrying a fine-grained admin permission (e.g. `assign-role`).
pub const PERMISSION_CLAIM: &str = "permission";

/// A `(type, value)` fact asserted about an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub claim_value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, claim_value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            claim_value: claim_value.into(),
        }
    }
}

impl core::fmt::Display for Claim {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}={}", self.claim_type, self.claim_value)
    }
}

/// Claims attached to one request's security context.
///
/// Evaluated by existence only: inserting the same claim twice is a no-op.
/// Matching is exact and case-sensitive; no normalization happens here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Claim>", into = "Vec<Claim>")]
pub struct ClaimSet {
    by_type: BTreeMap<String, BTreeSet<String>>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact match on both type and value.
    pub fn has_claim(&self, claim_type: &str, claim_value: &str) -> bool {
        self.by_type
            .get(claim_type)
            .is_some_and(|values| values.contains(claim_value))
    }

    /// Returns `true` if the claim was not already present.
    pub fn insert(&mut self, claim: Claim) -> bool {
        self.by_type
            .entry(claim.claim_type)
            .or_default()
            .insert(claim.claim_value)
    }

    /// Returns `true` if the claim was present.
    pub fn remove(&mut self, claim_type: &str, claim_value: &str) -> bool {
        let Some(values) = self.by_type.get_mut(claim_type) else {
            return false;
        };
        let removed = values.remove(claim_value);
        if values.is_empty() {
            self.by_type.remove(claim_type);
        }
        removed
    }

    /// All values held for a claim type, in sorted order.
    pub fn values_of<'a>(&'a self, claim_type: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.by_type
            .get(claim_type)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_type.iter().flat_map(|(claim_type, values)| {
            values
                .iter()
                .map(move |value| (claim_type.as_str(), value.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Claim> for ClaimSet {
    fn extend<I: IntoIterator<Item = Claim>>(&mut self, iter: I) {
        for claim in iter {
            self.insert(claim);
        }
    }
}

impl From<Vec<Claim>> for ClaimSet {
    fn from(value: Vec<Claim>) -> Self {
        value.into_iter().collect()
    }
}

impl From<ClaimSet> for Vec<Claim> {
    fn from(value: ClaimSet) -> Self {
        value
            .iter()
            .map(|(claim_type, claim_value)| Claim::new(claim_type, claim_value))
            .collect()
    }
}
