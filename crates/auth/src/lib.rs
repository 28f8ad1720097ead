//! `tutorhub-auth` — claim/role-based authorization decisions (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP, tokens and storage: it is
//! handed an already-resolved claim set and answers allow/deny.

pub mod authorize;
pub mod claims;
pub mod config;
pub mod guard;
pub mod handler;
pub mod permissions;
pub mod policies;
pub mod policy;
pub mod principal;
pub mod registry;
pub mod requirement;
pub mod roles;

pub use authorize::{AuthzError, Decision, DecisionExplanation, RequirementOutcome};
pub use claims::{Claim, ClaimSet, PERMISSION_CLAIM, ROLE_CLAIM};
pub use config::AccessConfig;
pub use guard::ActionGuard;
pub use handler::{ClaimHandler, FnHandler, RequirementHandler, Vote};
pub use permissions::Permission;
pub use policy::Policy;
pub use principal::Principal;
pub use registry::{HandlerRegistry, PolicyRegistry};
pub use requirement::{Requirement, RequirementKind};
pub use roles::Role;
