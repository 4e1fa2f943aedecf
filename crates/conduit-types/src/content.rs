//! Content items and the success/failure envelope produced by dispatch.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// One piece of content in a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Plain text.
    Text { text: String },
    /// A resource body, addressed by the URI it was read from.
    EmbeddedResource {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        text: String,
    },
}

impl ContentItem {
    /// Shorthand for a text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The textual body of the item, whatever its variant.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } | Self::EmbeddedResource { text, .. } => text,
        }
    }
}

/// Outcome of dispatching one capability request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CapabilityResponse {
    /// The handler produced content.
    Success { content: Vec<ContentItem> },
    /// Lookup, validation or the handler failed.
    Failure { kind: ErrorKind, message: String },
}

impl CapabilityResponse {
    /// A failure of `kind` carrying `message`.
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    /// The failure message, if this is a failure.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Failure { message, .. } => Some(message),
            Self::Success { .. } => None,
        }
    }

    /// Whether this is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}
