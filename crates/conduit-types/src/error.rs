//! Unified error types for the conduit domain layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No capability matches the requested name or URI.
    NotFound,
    /// Arguments are missing or malformed.
    InvalidInput,
    /// A capability with the same kind and name already exists.
    Conflict,
    /// A handler body failed.
    HandlerFault,
    /// A handler exceeded the request deadline.
    Timeout,
    /// The message channel failed or carried malformed frames.
    Transport,
    /// Internal error.
    Internal,
}

/// Domain-level error with structured context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConduitError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional context.
    pub context: Option<String>,
}

impl ConduitError {
    /// Creates a new `ConduitError`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Creates a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Creates a handler-fault error.
    pub fn handler_fault(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HandlerFault, message)
    }
}

impl fmt::Display for ConduitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConduitError {}

/// Transforms technical errors into user-actionable diagnostics.
///
/// Implementors provide optional `hint` (cause explanation) and `fix`
/// (concrete remediation step) for each error variant.
pub trait DiagnosticError {
    /// A human-readable explanation of the likely cause.
    fn hint(&self) -> Option<String> {
        None
    }
    /// A concrete fix the user can apply (e.g. a config change).
    fn fix(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_without_context() {
        let err = ConduitError::new(ErrorKind::NotFound, "Unknown tool: nope");
        assert_eq!(err.to_string(), "[NotFound] Unknown tool: nope");
    }

    #[test]
    fn error_display_with_context() {
        let err = ConduitError::not_found("Unknown resource").with_context("uri: note://x");
        assert!(err.to_string().contains("note://x"));
    }

    #[test]
    fn error_serialization_uses_snake_case_kind() {
        let err = ConduitError::handler_fault("disk full");
        let json = serde_json::to_string(&err).expect("serialize");
        assert!(json.contains("\"handler_fault\""));
        let back: ConduitError = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.kind, ErrorKind::HandlerFault);
        assert_eq!(back.message, "disk full");
    }

    #[test]
    fn invalid_input_constructor() {
        let err = ConduitError::invalid_input("bad data");
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn diagnostic_trait_defaults_to_none() {
        struct Dummy;
        impl DiagnosticError for Dummy {}
        let d = Dummy;
        assert!(d.hint().is_none());
        assert!(d.fix().is_none());
    }
}
