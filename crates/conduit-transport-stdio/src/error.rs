//! Transport-layer error types.

use conduit_types::{ConduitError, DiagnosticError, ErrorKind};
use thiserror::Error;

/// Errors from the stdio transport layer. Each one ends the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to read from stdin.
    #[error("read error: {0}")]
    Read(String),
    /// Failed to write to stdout.
    #[error("write error: {0}")]
    Write(String),
    /// An outbound message could not be serialised.
    #[error("serialize error: {0}")]
    Serialize(String),
    /// The server could not complete its side of the handshake.
    #[error("handshake failed: {0}")]
    Handshake(String),
}

impl From<TransportError> for ConduitError {
    fn from(e: TransportError) -> Self {
        let kind = match &e {
            TransportError::Read(_) | TransportError::Write(_) => ErrorKind::Transport,
            TransportError::Serialize(_) | TransportError::Handshake(_) => ErrorKind::Internal,
        };
        ConduitError::new(kind, e.to_string())
    }
}

impl DiagnosticError for TransportError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Read(_) | Self::Write(_) => {
                Some("The client closed or broke the stdio pipe.".into())
            }
            Self::Handshake(_) => {
                Some("The server refused to serve from an inconsistent registry.".into())
            }
            Self::Serialize(_) => None,
        }
    }

    fn fix(&self) -> Option<String> {
        None
    }
}
