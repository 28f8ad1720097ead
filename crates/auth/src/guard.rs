//! Action-level authorization guard.
//!
//! This enforces authorization at the action boundary (before the guarded
//! operation runs), while keeping the request layer policy-agnostic:
//! resolve the principal, call [`ActionGuard::check`], and on
//! [`AuthzError::Forbidden`] answer "forbidden" without executing anything.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::authorize::{AuthzError, Decision, DecisionExplanation};
use crate::{Policy, PolicyRegistry, Principal};

/// Binds action names (e.g. `users.assign-role`) to registered policies.
#[derive(Debug, Clone)]
pub struct ActionGuard {
    registry: PolicyRegistry,
    bindings: BTreeMap<String, String>,
}

impl ActionGuard {
    pub fn new(registry: PolicyRegistry) -> Self {
        Self {
            registry,
            bindings: BTreeMap::new(),
        }
    }

    /// Bind an action to a policy that is already registered.
    ///
    /// An action is bound at most once; rebinding is a configuration error.
    pub fn bind(
        &mut self,
        action: impl Into<String>,
        policy: impl Into<String>,
    ) -> Result<&mut Self, AuthzError> {
        let action = action.into();
        let policy = policy.into();

        if action.trim().is_empty() {
            return Err(AuthzError::Configuration(
                "action name must not be empty".to_string(),
            ));
        }
        if !self.registry.contains(&policy) {
            return Err(AuthzError::UnknownPolicy(policy));
        }
        if let Some(existing) = self.bindings.get(&action) {
            return Err(AuthzError::Configuration(format!(
                "action '{action}' is already bound to policy '{existing}'"
            )));
        }

        debug!(%action, %policy, "action bound");
        self.bindings.insert(action, policy);
        Ok(self)
    }

    pub fn policy_for(&self, action: &str) -> Option<&Policy> {
        self.bindings
            .get(action)
            .and_then(|policy| self.registry.get(policy))
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Decide without mapping a deny to an error.
    pub fn decide(&self, action: &str, principal: &Principal) -> Result<Decision, AuthzError> {
        let policy = self.bound_policy(action)?;
        self.registry.authorize(policy, principal)
    }

    /// `Ok(())` if the action may proceed; `Forbidden` if it must not.
    pub fn check(&self, action: &str, principal: &Principal) -> Result<(), AuthzError> {
        let policy = self.bound_policy(action)?;

        match self.registry.authorize(policy, principal)? {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                info!(
                    %action,
                    %policy,
                    principal = ?principal.id(),
                    "action forbidden"
                );
                Err(AuthzError::Forbidden {
                    action: action.to_string(),
                    policy: policy.to_string(),
                })
            }
        }
    }

    pub fn explain(
        &self,
        action: &str,
        principal: &Principal,
    ) -> Result<DecisionExplanation, AuthzError> {
        let policy = self.bound_policy(action)?;
        self.registry.explain(policy, principal)
    }

    fn bound_policy(&self, action: &str) -> Result<&str, AuthzError> {
        self.bindings
            .get(action)
            .map(String::as_str)
            .ok_or_else(|| AuthzError::UnknownAction(action.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tutorhub_core::UserId;

    use super::*;
    use crate::{Claim, ClaimSet, HandlerRegistry, Requirement};

    fn guard() -> ActionGuard {
        let mut registry = PolicyRegistry::new(HandlerRegistry::with_builtin());
        registry
            .register(Policy::new("admin-only").require(Requirement::claim("role", "admin")))
            .unwrap();
        registry.register(Policy::new("open")).unwrap();

        let mut guard = ActionGuard::new(registry);
        guard.bind("tutors.verify", "admin-only").unwrap();
        guard.bind("blog.read", "open").unwrap();
        guard
    }

    fn principal(claims: &[(&str, &str)]) -> Principal {
        let claims: ClaimSet = claims.iter().map(|(t, v)| Claim::new(*t, *v)).collect();
        Principal::new(UserId::new(), claims)
    }

    #[test]
    fn allowed_action_proceeds() {
        assert_eq!(guard().check("tutors.verify", &principal(&[("role", "admin")])), Ok(()));
    }

    #[test]
    fn denied_action_is_forbidden() {
        let err = guard()
            .check("tutors.verify", &principal(&[("role", "parent")]))
            .unwrap_err();

        assert_eq!(
            err,
            AuthzError::Forbidden {
                action: "tutors.verify".to_string(),
                policy: "admin-only".to_string(),
            }
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn open_action_allows_anonymous() {
        assert_eq!(guard().check("blog.read", &Principal::anonymous()), Ok(()));
    }

    #[test]
    fn unbound_action_is_a_configuration_fault() {
        let err = guard()
            .check("payments.refund", &principal(&[("role", "admin")]))
            .unwrap_err();

        assert_eq!(err, AuthzError::UnknownAction("payments.refund".to_string()));
        assert!(err.is_configuration());
    }

    #[test]
    fn binding_requires_registered_policy_and_is_unique() {
        let mut guard = guard();

        assert_eq!(
            guard.bind("payments.refund", "finance").unwrap_err(),
            AuthzError::UnknownPolicy("finance".to_string())
        );
        assert!(matches!(
            guard.bind("tutors.verify", "open"),
            Err(AuthzError::Configuration(_))
        ));
    }

    #[test]
    fn decide_reports_deny_without_error() {
        assert_eq!(
            guard().decide("tutors.verify", &Principal::anonymous()),
            Ok(Decision::Deny)
        );
    }
}
