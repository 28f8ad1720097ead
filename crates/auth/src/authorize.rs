use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{Claim, HandlerRegistry, Policy, Principal, Requirement};

/// Terminal outcome of one authorization check. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Decision::Allow => f.write_str("allow"),
            Decision::Deny => f.write_str("deny"),
        }
    }
}

/// Authorization faults.
///
/// A deny is not a fault: evaluation yields [`Decision::Deny`]. Only the
/// action guard turns a deny into [`AuthzError::Forbidden`] for its caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authorization misconfigured: {0}")]
    Configuration(String),

    #[error("policy '{0}' is already registered")]
    DuplicatePolicy(String),

    #[error("unknown policy '{0}'")]
    UnknownPolicy(String),

    #[error("no policy bound to action '{0}'")]
    UnknownAction(String),

    #[error("forbidden: action '{action}' denied by policy '{policy}'")]
    Forbidden { action: String, policy: String },
}

impl AuthzError {
    /// Wiring problems that should abort startup rather than deny a request.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, AuthzError::Forbidden { .. })
    }
}

/// Decide whether `principal` satisfies every requirement of `policy`.
///
/// - No IO
/// - No panics
/// - Pure: the same (policy, claims) always yields the same decision
///
/// A requirement passes when at least one handler registered for its kind
/// votes `Succeed`. `policy` must already be validated against `handlers`;
/// the public entry points ([`HandlerRegistry::authorize`],
/// [`crate::PolicyRegistry::authorize`], [`crate::ActionGuard::check`]) all
/// guarantee that.
pub(crate) fn authorize(policy: &Policy, principal: &Principal, handlers: &HandlerRegistry) -> Decision {
    // No constraints to violate.
    if policy.is_unconstrained() {
        debug!(policy = %policy.name, "policy has no requirements; allowing");
        return Decision::Allow;
    }

    for requirement in &policy.requirements {
        if !handlers.vote(requirement, principal).succeeded() {
            debug!(
                policy = %policy.name,
                requirement = %requirement,
                "requirement not satisfied; denying"
            );
            return Decision::Deny;
        }
    }

    debug!(policy = %policy.name, "all requirements satisfied; allowing");
    Decision::Allow
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Per-requirement result inside a [`DecisionExplanation`].
#[derive(Debug, Clone, Serialize)]
pub struct RequirementOutcome {
    pub requirement: Requirement,
    pub satisfied: bool,
}

/// Auditable account of why a policy allowed or denied a principal.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionExplanation {
    pub policy: String,
    pub decision: Decision,
    pub reason: String,
    pub requirements: Vec<RequirementOutcome>,
    pub principal_claims: Vec<Claim>,
}

impl DecisionExplanation {
    pub fn unsatisfied(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements
            .iter()
            .filter(|outcome| !outcome.satisfied)
            .map(|outcome| &outcome.requirement)
    }
}

/// Evaluate every requirement (no short-circuit) and report each outcome.
///
/// The decision always matches `authorize` for the same inputs, and the same
/// validation precondition applies.
pub(crate) fn explain(
    policy: &Policy,
    principal: &Principal,
    handlers: &HandlerRegistry,
) -> DecisionExplanation {
    let requirements: Vec<RequirementOutcome> = policy
        .requirements
        .iter()
        .map(|requirement| RequirementOutcome {
            requirement: requirement.clone(),
            satisfied: handlers.vote(requirement, principal).succeeded(),
        })
        .collect();

    let principal_claims: Vec<Claim> = principal.claims().clone().into();
    let missing: Vec<String> = requirements
        .iter()
        .filter(|outcome| !outcome.satisfied)
        .map(|outcome| outcome.requirement.to_string())
        .collect();

    let (decision, reason) = if requirements.is_empty() {
        (Decision::Allow, "Policy has no requirements".to_string())
    } else if missing.is_empty() {
        (
            Decision::Allow,
            format!("All {} requirement(s) satisfied", requirements.len()),
        )
    } else {
        (
            Decision::Deny,
            format!("Unsatisfied requirement(s): {}", missing.join(", ")),
        )
    };

    DecisionExplanation {
        policy: policy.name.clone(),
        decision,
        reason,
        requirements,
        principal_claims,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{ClaimSet, RequirementKind, Vote};

    fn principal_with(claims: &[(&str, &str)]) -> Principal {
        Principal::from_claims(claims.iter().map(|(t, v)| Claim::new(*t, *v)).collect())
    }

    fn handlers() -> HandlerRegistry {
        HandlerRegistry::with_builtin()
    }

    #[test]
    fn admin_claim_allows_admin_policy() {
        let principal = principal_with(&[("role", "admin")]);
        let policy = Policy::new("admin").require(Requirement::claim("role", "admin"));

        assert_eq!(authorize(&policy, &principal, &handlers()), Decision::Allow);
    }

    #[test]
    fn tutor_claim_denies_admin_policy() {
        let principal = principal_with(&[("role", "tutor")]);
        let policy = Policy::new("admin").require(Requirement::claim("role", "admin"));

        assert_eq!(authorize(&policy, &principal, &handlers()), Decision::Deny);
    }

    #[test]
    fn every_requirement_must_pass() {
        let policy = Policy::with_requirements(
            "assign-role",
            [
                Requirement::claim("role", "admin"),
                Requirement::claim("claim", "assign-role"),
            ],
        );

        let both = principal_with(&[("role", "admin"), ("claim", "assign-role")]);
        assert_eq!(authorize(&policy, &both, &handlers()), Decision::Allow);

        let only_role = principal_with(&[("role", "admin")]);
        assert_eq!(authorize(&policy, &only_role, &handlers()), Decision::Deny);
    }

    #[test]
    fn empty_policy_allows_even_anonymous() {
        let policy = Policy::new("open");

        assert_eq!(
            authorize(&policy, &Principal::anonymous(), &handlers()),
            Decision::Allow
        );
        assert_eq!(
            authorize(&policy, &Principal::anonymous(), &HandlerRegistry::new()),
            Decision::Allow
        );
    }

    #[test]
    fn unhandled_kind_is_a_configuration_error_not_a_deny() {
        let principal = principal_with(&[("role", "admin")]);
        let policy = Policy::new("tenure").require(Requirement::threshold("admin_tenure_days", 30));

        assert!(matches!(
            handlers().authorize(&policy, &principal),
            Err(AuthzError::Configuration(_))
        ));
        assert!(matches!(
            handlers().explain(&policy, &Principal::anonymous()),
            Err(AuthzError::Configuration(_))
        ));
    }

    #[test]
    fn validated_entry_point_matches_evaluation() {
        let principal = principal_with(&[("role", "tutor")]);
        let policy = Policy::new("admin").require(Requirement::claim("role", "admin"));

        assert_eq!(handlers().authorize(&policy, &principal), Ok(Decision::Deny));
        assert_eq!(
            handlers().authorize(&Policy::new("open"), &Principal::anonymous()),
            Ok(Decision::Allow)
        );
    }

    #[test]
    fn one_succeeding_handler_is_enough() {
        let mut registry = HandlerRegistry::with_builtin();
        registry.register(crate::FnHandler::new(
            RequirementKind::Claim,
            "abstainer",
            |_, _| Vote::Abstain,
        ));

        let principal = principal_with(&[("role", "admin")]);
        let policy = Policy::new("admin").require(Requirement::claim("role", "admin"));

        assert_eq!(authorize(&policy, &principal, &registry), Decision::Allow);
    }

    #[test]
    fn explanation_lists_unsatisfied_requirements() {
        let principal = principal_with(&[("role", "admin")]);
        let policy = Policy::with_requirements(
            "assign-claim",
            [
                Requirement::claim("role", "admin"),
                Requirement::claim("permission", "assign-claim"),
                Requirement::claim("claim", "verified"),
            ],
        );

        let explanation = explain(&policy, &principal, &handlers());

        assert_eq!(explanation.decision, Decision::Deny);
        let missing: Vec<String> = explanation.unsatisfied().map(ToString::to_string).collect();
        assert_eq!(
            missing,
            vec![
                "claim permission=assign-claim".to_string(),
                "claim claim=verified".to_string(),
            ]
        );
        assert!(explanation.requirements[0].satisfied);
        assert_eq!(explanation.principal_claims, vec![Claim::new("role", "admin")]);
    }

    #[test]
    fn errors_distinguish_faults_from_denies() {
        assert!(AuthzError::Configuration("x".into()).is_configuration());
        assert!(AuthzError::UnknownAction("x".into()).is_configuration());
        assert!(
            !AuthzError::Forbidden {
                action: "a".into(),
                policy: "p".into()
            }
            .is_configuration()
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Properties
    // ─────────────────────────────────────────────────────────────────────

    const UNIVERSE: &[(&str, &str)] = &[
        ("role", "admin"),
        ("role", "tutor"),
        ("role", "parent"),
        ("permission", "assign-role"),
        ("permission", "assign-claim"),
        ("claim", "verified"),
    ];

    fn claim_index() -> impl Strategy<Value = usize> {
        0..UNIVERSE.len()
    }

    fn claims_from(indices: &[usize]) -> ClaimSet {
        indices
            .iter()
            .map(|i| Claim::new(UNIVERSE[*i].0, UNIVERSE[*i].1))
            .collect()
    }

    fn policy_from(indices: &[usize]) -> Policy {
        Policy::with_requirements(
            "generated",
            indices
                .iter()
                .map(|i| Requirement::claim(UNIVERSE[*i].0, UNIVERSE[*i].1)),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: allow iff every requirement is held by the principal.
        #[test]
        fn allow_iff_all_requirements_held(
            held in prop::collection::vec(claim_index(), 0..6),
            required in prop::collection::vec(claim_index(), 0..5),
        ) {
            let principal = Principal::from_claims(claims_from(&held));
            let policy = policy_from(&required);

            let expected = required.iter().all(|i| held.contains(i));
            let decision = authorize(&policy, &principal, &handlers());
            prop_assert_eq!(decision.is_allowed(), expected);
            prop_assert_eq!(explain(&policy, &principal, &handlers()).decision, decision);
        }

        /// Property: a policy with no requirements allows every principal.
        #[test]
        fn empty_policy_always_allows(held in prop::collection::vec(claim_index(), 0..6)) {
            let principal = Principal::from_claims(claims_from(&held));
            prop_assert_eq!(
                authorize(&Policy::new("empty"), &principal, &handlers()),
                Decision::Allow
            );
        }

        /// Property: repeated evaluation yields the same decision.
        #[test]
        fn authorize_is_idempotent(
            held in prop::collection::vec(claim_index(), 0..6),
            required in prop::collection::vec(claim_index(), 0..5),
        ) {
            let principal = Principal::from_claims(claims_from(&held));
            let policy = policy_from(&required);

            let first = authorize(&policy, &principal, &handlers());
            let second = authorize(&policy, &principal, &handlers());
            prop_assert_eq!(first, second);
        }

        /// Property: permuting the requirement list does not change the decision.
        #[test]
        fn requirement_order_is_irrelevant(
            held in prop::collection::vec(claim_index(), 0..6),
            required in prop::collection::vec(claim_index(), 0..5)
                .prop_flat_map(|v| Just(v.clone()).prop_shuffle().prop_map(move |s| (v.clone(), s))),
        ) {
            let (original, shuffled) = required;
            let principal = Principal::from_claims(claims_from(&held));

            prop_assert_eq!(
                authorize(&policy_from(&original), &principal, &handlers()),
                authorize(&policy_from(&shuffled), &principal, &handlers())
            );
        }

        /// Property: removing any one matching claim from an allowed principal denies.
        #[test]
        fn removing_a_required_claim_flips_to_deny(
            required in prop::collection::vec(claim_index(), 1..5),
            pick in any::<prop::sample::Index>(),
        ) {
            let mut claims = claims_from(&required);
            let policy = policy_from(&required);
            prop_assert!(authorize(&policy, &Principal::from_claims(claims.clone()), &handlers()).is_allowed());

            let (claim_type, claim_value) = UNIVERSE[required[pick.index(required.len())]];
            claims.remove(claim_type, claim_value);

            prop_assert_eq!(
                authorize(&policy, &Principal::from_claims(claims), &handlers()),
                Decision::Deny
            );
        }
    }
}
