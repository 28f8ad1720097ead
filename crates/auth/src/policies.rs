//! Built-in marketplace policies and the actions they guard.

use crate::{ActionGuard, AuthzError, HandlerRegistry, Permission, Policy, PolicyRegistry, Requirement, Role};

pub const ASSIGN_ROLE_POLICY: &str = "assign-role";
pub const ASSIGN_CLAIM_POLICY: &str = "assign-claim";
pub const ADMIN_ONLY_POLICY: &str = "admin-only";
pub const TUTOR_ONLY_POLICY: &str = "tutor-only";

pub const ASSIGN_ROLE_ACTION: &str = "users.assign-role";
pub const ASSIGN_CLAIM_ACTION: &str = "users.assign-claim";
pub const VERIFY_TUTOR_ACTION: &str = "tutors.verify";
pub const PUBLISH_SCHEDULE_ACTION: &str = "schedules.publish";

/// Admin holding the `assign-role` permission.
pub fn assign_role() -> Policy {
    Policy::new(ASSIGN_ROLE_POLICY)
        .require(Requirement::role(&Role::ADMIN))
        .require(Requirement::permission(&Permission::ASSIGN_ROLE))
}

/// Admin holding the `assign-claim` permission.
pub fn assign_claim() -> Policy {
    Policy::new(ASSIGN_CLAIM_POLICY)
        .require(Requirement::role(&Role::ADMIN))
        .require(Requirement::permission(&Permission::ASSIGN_CLAIM))
}

pub fn admin_only() -> Policy {
    Policy::new(ADMIN_ONLY_POLICY).require(Requirement::role(&Role::ADMIN))
}

pub fn tutor_only() -> Policy {
    Policy::new(TUTOR_ONLY_POLICY).require(Requirement::role(&Role::TUTOR))
}

/// Generic "must hold claim `claim_type=claim_value`" policy.
pub fn require_claim(
    name: impl Into<String>,
    claim_type: impl Into<String>,
    claim_value: impl Into<String>,
) -> Policy {
    Policy::new(name).require(Requirement::claim(claim_type, claim_value))
}

pub fn builtin_policies() -> Vec<Policy> {
    vec![assign_role(), assign_claim(), admin_only(), tutor_only()]
}

/// Guard with the built-in policies bound to the marketplace admin actions.
pub fn default_guard() -> Result<ActionGuard, AuthzError> {
    let mut registry = PolicyRegistry::new(HandlerRegistry::with_builtin());
    registry.register_all(builtin_policies())?;

    let mut guard = ActionGuard::new(registry);
    guard
        .bind(ASSIGN_ROLE_ACTION, ASSIGN_ROLE_POLICY)?
        .bind(ASSIGN_CLAIM_ACTION, ASSIGN_CLAIM_POLICY)?
        .bind(VERIFY_TUTOR_ACTION, ADMIN_ONLY_POLICY)?
        .bind(PUBLISH_SCHEDULE_ACTION, TUTOR_ONLY_POLICY)?;
    Ok(guard)
}
