//! Error types for the ambient-context bridge.

use thiserror::Error;

/// Errors raised while resolving host ambient-context primitives.
///
/// Resolution errors are never surfaced to bridge consumers; capability
/// detection swallows them and records the capability as unsupported for the
/// life of the process. They exist so host bindings can report precisely
/// which primitive failed, and so the detection log line carries a reason.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no ambient-context host is available")]
    NoHost,

    #[error("host primitive `{name}` failed to resolve: {reason}")]
    Primitive { name: &'static str, reason: String },
}

impl ResolveError {
    /// Resolution failure for a named primitive.
    pub fn primitive(name: &'static str, reason: impl Into<String>) -> Self {
        ResolveError::Primitive {
            name,
            reason: reason.into(),
        }
    }
}

/// Errors raised when installing a host binding.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("capability detection already ran; host bindings must be installed at startup")]
    AlreadyDetected,
}
