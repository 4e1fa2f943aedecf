//! Errors raised by the demo servers.

use conduit_registry::{HandlerFault, RegistryError};
use conduit_types::{ConduitError, DiagnosticError, ErrorKind};
use thiserror::Error;

/// Errors from building or running a demo server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No server by that name.
    #[error("unknown server: {0} (expected one of notes, earnings, forex, orders, git-prompts)")]
    UnknownServer(String),
    /// A capability could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A slug that is not a single path component.
    #[error("invalid note slug '{0}'")]
    InvalidSlug(String),
    /// A forex pair that is not six letters.
    #[error("invalid currency pair '{0}': expected six letters like USDJPY")]
    InvalidPair(String),
    /// An argument present but unusable.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
    /// The HTTP client could not be built.
    #[error("http client setup failed: {0}")]
    Client(String),
    /// Note store file-system failure.
    #[error("note store: {0}")]
    Io(#[from] std::io::Error),
    /// An outbound call failed.
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },
}

impl ServerError {
    pub(crate) fn invalid_argument(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ServerError> for HandlerFault {
    fn from(e: ServerError) -> Self {
        HandlerFault::other(e)
    }
}

impl From<ServerError> for ConduitError {
    fn from(e: ServerError) -> Self {
        let kind = match e {
            ServerError::Registry(inner) => return inner.into(),
            ServerError::UnknownServer(_) => ErrorKind::NotFound,
            ServerError::InvalidSlug(_)
            | ServerError::InvalidPair(_)
            | ServerError::InvalidArgument { .. } => ErrorKind::InvalidInput,
            ServerError::Client(_) => ErrorKind::Internal,
            ServerError::Io(_) | ServerError::Http { .. } => ErrorKind::HandlerFault,
        };
        ConduitError::new(kind, e.to_string())
    }
}

impl DiagnosticError for ServerError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Registry(e) => e.hint(),
            Self::InvalidSlug(_) => {
                Some("Slugs name a file in the notes directory and cannot contain path separators.".into())
            }
            Self::Http { .. } => Some("Check network access and the configured API base URL.".into()),
            _ => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::Registry(e) => e.fix(),
            Self::UnknownServer(_) => Some("Run `conduit inspect <server>` with a listed name.".into()),
            Self::Http { .. } => Some(
                "Set `alpha_vantage.api_key` (or ALPHA_VANTAGE_KEY) and the `alpaca` keys in the config file.".into(),
            ),
            _ => None,
        }
    }
}
