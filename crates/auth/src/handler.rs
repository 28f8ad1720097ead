//! Requirement handlers: one requirement, one principal, one vote.
//!
//! Handlers either vote `Succeed` or `Abstain`. There is no "fail" vote:
//! absence of success is the default deny, decided by the aggregator.

use crate::{Principal, Requirement, RequirementKind};

/// Outcome of evaluating one requirement with one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Succeed,
    Abstain,
}

impl Vote {
    pub fn succeeded(self) -> bool {
        matches!(self, Vote::Succeed)
    }
}

/// Evaluates requirements of a single kind.
///
/// Implementations must be pure: no IO, no interior mutation, and the same
/// inputs always produce the same vote. A handler handed a requirement of a
/// different kind abstains.
pub trait RequirementHandler: core::fmt::Debug + Send + Sync {
    fn kind(&self) -> RequirementKind;

    fn evaluate(&self, requirement: &Requirement, principal: &Principal) -> Vote;
}

/// Built-in handler for [`RequirementKind::Claim`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ClaimHandler;

impl RequirementHandler for ClaimHandler {
    fn kind(&self) -> RequirementKind {
        RequirementKind::Claim
    }

    fn evaluate(&self, requirement: &Requirement, principal: &Principal) -> Vote {
        match requirement {
            Requirement::Claim {
                claim_type,
                claim_value,
            } if principal.has_claim(claim_type, claim_value) => Vote::Succeed,
            _ => Vote::Abstain,
        }
    }
}

/// Adapts a plain function into a handler for one kind.
///
/// Used to wire handlers for requirement kinds that have no built-in logic,
/// such as tenure thresholds backed by an external directory.
pub struct FnHandler<F> {
    kind: RequirementKind,
    name: &'static str,
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Requirement, &Principal) -> Vote + Send + Sync,
{
    pub fn new(kind: RequirementKind, name: &'static str, f: F) -> Self {
        Self { kind, name, f }
    }
}

impl<F> core::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnHandler")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}

impl<F> RequirementHandler for FnHandler<F>
where
    F: Fn(&Requirement, &Principal) -> Vote + Send + Sync,
{
    fn kind(&self) -> RequirementKind {
        self.kind
    }

    fn evaluate(&self, requirement: &Requirement, principal: &Principal) -> Vote {
        if requirement.kind() != self.kind {
            return Vote::Abstain;
        }
        (self.f)(requirement, principal)
    }
}
