//! Registry error types.

use conduit_types::{CapabilityKind, ConduitError, DiagnosticError, ErrorKind};
use thiserror::Error;

use crate::uri_template::TemplateError;

/// Errors from registering or resolving capabilities.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A capability with this kind and name is already registered.
    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: CapabilityKind, name: String },
    /// Nothing matches the requested name or URI.
    #[error("Unknown {kind}: {name}")]
    NotFound { kind: CapabilityKind, name: String },
    /// A resource was registered with an unparseable URI template.
    #[error("invalid URI template for {name}: {source}")]
    InvalidTemplate {
        name: String,
        #[source]
        source: TemplateError,
    },
    /// The descriptor's schema does not fit its kind.
    #[error("{kind} '{name}' has a schema of the wrong shape")]
    SchemaMismatch { kind: CapabilityKind, name: String },
}

impl From<RegistryError> for ConduitError {
    fn from(e: RegistryError) -> Self {
        let kind = match &e {
            RegistryError::DuplicateName { .. } => ErrorKind::Conflict,
            RegistryError::NotFound { .. } => ErrorKind::NotFound,
            RegistryError::InvalidTemplate { .. } | RegistryError::SchemaMismatch { .. } => {
                ErrorKind::InvalidInput
            }
        };
        ConduitError::new(kind, e.to_string())
    }
}

impl DiagnosticError for RegistryError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::DuplicateName { kind, name } => Some(format!(
                "Two {kind}s named '{name}' were registered; the first one is kept."
            )),
            Self::InvalidTemplate { .. } => {
                Some("Templates look like `scheme://{var}/literal`.".into())
            }
            _ => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::DuplicateName { .. } => Some("Rename one of the capabilities.".into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_matches_failure_format() {
        let e = RegistryError::NotFound {
            kind: CapabilityKind::Tool,
            name: "nope".into(),
        };
        assert_eq!(e.to_string(), "Unknown tool: nope");
        let c: ConduitError = e.into();
        assert_eq!(c.kind, ErrorKind::NotFound);
    }

    #[test]
    fn duplicate_maps_to_conflict_with_hint() {
        let e = RegistryError::DuplicateName {
            kind: CapabilityKind::Prompt,
            name: "p".into(),
        };
        assert!(e.hint().expect("hint").contains("first one is kept"));
        let c: ConduitError = e.into();
        assert_eq!(c.kind, ErrorKind::Conflict);
    }
}
