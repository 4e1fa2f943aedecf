//! Dispatch failure types.
//!
//! Every variant renders the user-visible failure text; the
//! [`ErrorKind`] picks the JSON-RPC error code where one is needed.

use std::time::Duration;

use conduit_types::{CapabilityKind, CapabilityResponse, ConduitError, DiagnosticError, ErrorKind};
use thiserror::Error;

/// Why a capability request did not produce content.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Nothing is registered under the requested name or URI.
    #[error("Unknown {kind}: {name}")]
    NotFound { kind: CapabilityKind, name: String },
    /// Arguments failed schema validation.
    #[error("Invalid arguments for {kind} '{name}': {detail}")]
    InvalidArguments {
        kind: CapabilityKind,
        name: String,
        detail: String,
    },
    /// The handler body raised a fault.
    #[error("Error in {kind} '{name}': {cause}")]
    Fault {
        kind: CapabilityKind,
        name: String,
        cause: String,
    },
    /// The handler ran past the request deadline.
    #[error("Error in {kind} '{name}': timed out after {}", format_duration(.after))]
    Timeout {
        kind: CapabilityKind,
        name: String,
        after: Duration,
    },
    /// The handler asked for sampling but the client never offered it.
    #[error("Error in {kind} '{name}': client does not support sampling")]
    SamplingUnsupported { kind: CapabilityKind, name: String },
}

impl DispatchError {
    /// Classification used by the MCP layer.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArguments { .. } => ErrorKind::InvalidInput,
            Self::Fault { .. } | Self::SamplingUnsupported { .. } => ErrorKind::HandlerFault,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// The failure envelope for this error.
    pub fn into_response(self) -> CapabilityResponse {
        let e = ConduitError::from(self);
        CapabilityResponse::failure(e.kind, e.message)
    }
}

fn format_duration(d: &Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

impl From<DispatchError> for ConduitError {
    fn from(e: DispatchError) -> Self {
        ConduitError::new(e.error_kind(), e.to_string())
    }
}

impl DiagnosticError for DispatchError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Timeout { after, .. } => Some(format!(
                "The handler did not finish within {}.",
                format_duration(after)
            )),
            Self::SamplingUnsupported { .. } => {
                Some("The client did not declare the `sampling` capability.".into())
            }
            _ => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::Timeout { .. } => Some(
                "Raise the deadline in conduit.toml:\n  [server]\n  request_timeout_secs = 60"
                    .into(),
            ),
            _ => None,
        }
    }
}
