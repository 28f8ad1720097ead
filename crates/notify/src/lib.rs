//! `tutorhub-notify` — live notification connection tracking.
//!
//! The notification hub needs to know which live connection belongs to which
//! user. That map is owned by [`ConnectionRegistry`] and injected wherever it
//! is needed; there is no process-wide static.

pub mod registry;

pub use registry::{ConnectionInfo, ConnectionRegistry};
