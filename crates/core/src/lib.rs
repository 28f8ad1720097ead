//! `tutorhub-core` — shared primitives for the tutoring marketplace.
//!
//! Identifiers and the domain error model; no infrastructure concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ConnectionId, UserId};
