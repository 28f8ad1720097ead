//! Startup-time wiring: which handlers evaluate which requirement kinds, and
//! which policies exist.
//!
//! Both registries are built once and then shared read-only. Every policy is
//! validated against the handler registry when it is registered, so a policy
//! naming a kind nobody can evaluate aborts startup instead of silently
//! denying at request time.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::authorize::{AuthzError, Decision, DecisionExplanation, authorize, explain};
use crate::{ClaimHandler, Policy, Principal, Requirement, RequirementHandler, RequirementKind, Vote};

/// Mapping from requirement kind to the handlers that evaluate it.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<RequirementKind, Vec<Arc<dyn RequirementHandler>>>,
}

impl HandlerRegistry {
    /// An empty registry; no requirement kind is handled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in [`ClaimHandler`].
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(ClaimHandler);
        registry
    }

    pub fn register<H>(&mut self, handler: H) -> &mut Self
    where
        H: RequirementHandler + 'static,
    {
        let kind = handler.kind();
        self.handlers
            .entry(kind)
            .or_default()
            .push(Arc::new(handler));
        self
    }

    pub fn handles(&self, kind: RequirementKind) -> bool {
        self.handlers
            .get(&kind)
            .is_some_and(|handlers| !handlers.is_empty())
    }

    pub fn kinds(&self) -> impl Iterator<Item = RequirementKind> + '_ {
        self.handlers
            .iter()
            .filter(|(_, handlers)| !handlers.is_empty())
            .map(|(kind, _)| *kind)
    }

    /// Succeed iff any handler registered for the requirement's kind succeeds.
    pub(crate) fn vote(&self, requirement: &Requirement, principal: &Principal) -> Vote {
        let satisfied = self
            .handlers
            .get(&requirement.kind())
            .into_iter()
            .flatten()
            .any(|handler| handler.evaluate(requirement, principal).succeeded());

        if satisfied { Vote::Succeed } else { Vote::Abstain }
    }

    /// Check that every requirement of `policy` can be evaluated.
    pub fn validate(&self, policy: &Policy) -> Result<(), AuthzError> {
        if policy.name.trim().is_empty() {
            return Err(AuthzError::Configuration(
                "policy name must not be empty".to_string(),
            ));
        }

        for requirement in &policy.requirements {
            requirement.validate().map_err(|e| {
                warn!(policy = %policy.name, error = %e, "malformed requirement");
                AuthzError::Configuration(format!("policy '{}': {e}", policy.name))
            })?;

            let kind = requirement.kind();
            if !self.handles(kind) {
                warn!(policy = %policy.name, %kind, "no handler registered for requirement kind");
                return Err(AuthzError::Configuration(format!(
                    "policy '{}' requires '{}' but no handler is registered for kind '{}'",
                    policy.name, requirement, kind
                )));
            }
        }

        Ok(())
    }

    /// Validate `policy`, then decide. For ad hoc policies that are not kept
    /// in a [`PolicyRegistry`].
    pub fn authorize(&self, policy: &Policy, principal: &Principal) -> Result<Decision, AuthzError> {
        self.validate(policy)?;
        Ok(authorize(policy, principal, self))
    }

    pub fn explain(
        &self,
        policy: &Policy,
        principal: &Principal,
    ) -> Result<DecisionExplanation, AuthzError> {
        self.validate(policy)?;
        Ok(explain(policy, principal, self))
    }
}

/// Validated, named policies plus the handlers that evaluate them.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    handlers: HandlerRegistry,
    policies: BTreeMap<String, Policy>,
}

impl PolicyRegistry {
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self {
            handlers,
            policies: BTreeMap::new(),
        }
    }

    /// Validate and add a policy. Names are unique.
    pub fn register(&mut self, policy: Policy) -> Result<(), AuthzError> {
        self.handlers.validate(&policy)?;

        if self.policies.contains_key(&policy.name) {
            warn!(policy = %policy.name, "duplicate policy registration");
            return Err(AuthzError::DuplicatePolicy(policy.name));
        }

        info!(
            policy = %policy.name,
            requirements = policy.requirements.len(),
            "policy registered"
        );
        self.policies.insert(policy.name.clone(), policy);
        Ok(())
    }

    pub fn register_all(
        &mut self,
        policies: impl IntoIterator<Item = Policy>,
    ) -> Result<(), AuthzError> {
        for policy in policies {
            self.register(policy)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Authorize against a registered policy. An unknown name is a fault,
    /// not a deny.
    pub fn authorize(&self, name: &str, principal: &Principal) -> Result<Decision, AuthzError> {
        let policy = self
            .get(name)
            .ok_or_else(|| AuthzError::UnknownPolicy(name.to_string()))?;
        Ok(authorize(policy, principal, &self.handlers))
    }

    pub fn explain(
        &self,
        name: &str,
        principal: &Principal,
    ) -> Result<DecisionExplanation, AuthzError> {
        let policy = self
            .get(name)
            .ok_or_else(|| AuthzError::UnknownPolicy(name.to_string()))?;
        Ok(explain(policy, principal, &self.handlers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Claim, FnHandler};

    fn admin() -> Principal {
        Principal::from_claims([Claim::new("role", "admin")].into_iter().collect())
    }

    #[test]
    fn builtin_registry_handles_claims_only() {
        let handlers = HandlerRegistry::with_builtin();

        assert!(handlers.handles(RequirementKind::Claim));
        assert!(!handlers.handles(RequirementKind::Threshold));
        assert_eq!(handlers.kinds().collect::<Vec<_>>(), vec![RequirementKind::Claim]);
    }

    #[test]
    fn registering_unhandled_kind_fails_fast() {
        let mut registry = PolicyRegistry::new(HandlerRegistry::with_builtin());
        let policy = Policy::new("senior-admin")
            .require(Requirement::claim("role", "admin"))
            .require(Requirement::threshold("admin_tenure_days", 90));

        let err = registry.register(policy).unwrap_err();

        assert!(matches!(err, AuthzError::Configuration(_)));
        assert!(!registry.contains("senior-admin"));
    }

    #[test]
    fn explicit_handler_makes_threshold_registrable() {
        let mut handlers = HandlerRegistry::with_builtin();
        handlers.register(FnHandler::new(
            RequirementKind::Threshold,
            "tenure",
            |requirement, principal| match requirement {
                Requirement::Threshold {
                    metric_name,
                    threshold_value,
                } => {
                    let reached = principal
                        .claims()
                        .values_of(metric_name)
                        .filter_map(|v| v.parse::<i64>().ok())
                        .any(|v| v >= *threshold_value);
                    if reached { Vote::Succeed } else { Vote::Abstain }
                }
                _ => Vote::Abstain,
            },
        ));

        let mut registry = PolicyRegistry::new(handlers);
        registry
            .register(Policy::new("senior-admin").require(Requirement::threshold("tenure_days", 90)))
            .unwrap();

        let senior = Principal::from_claims([Claim::new("tenure_days", "120")].into_iter().collect());
        let junior = Principal::from_claims([Claim::new("tenure_days", "12")].into_iter().collect());

        assert_eq!(registry.authorize("senior-admin", &senior).unwrap(), Decision::Allow);
        assert_eq!(registry.authorize("senior-admin", &junior).unwrap(), Decision::Deny);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = PolicyRegistry::new(HandlerRegistry::with_builtin());
        registry.register(Policy::new("admin-only")).unwrap();

        let err = registry.register(Policy::new("admin-only")).unwrap_err();
        assert_eq!(err, AuthzError::DuplicatePolicy("admin-only".to_string()));
    }

    #[test]
    fn blank_claim_fields_are_rejected() {
        let mut registry = PolicyRegistry::new(HandlerRegistry::with_builtin());

        for requirement in [Requirement::claim("", "admin"), Requirement::claim("role", "  ")] {
            let err = registry
                .register(Policy::new("broken").require(requirement))
                .unwrap_err();
            assert!(matches!(err, AuthzError::Configuration(_)));
        }
        assert!(!registry.contains("broken"));
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut registry = PolicyRegistry::new(HandlerRegistry::with_builtin());
        assert!(matches!(
            registry.register(Policy::new("  ")),
            Err(AuthzError::Configuration(_))
        ));
    }

    #[test]
    fn unknown_policy_is_a_fault_not_a_deny() {
        let registry = PolicyRegistry::new(HandlerRegistry::with_builtin());

        assert_eq!(
            registry.authorize("missing", &admin()),
            Err(AuthzError::UnknownPolicy("missing".to_string()))
        );
    }
}
