//! Tracing/logging setup shared by every tutorhub process.

/// Initialize process-wide logging from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&tracing::LogConfig::from_env());
}

/// Subscriber configuration and installation.
pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat};
