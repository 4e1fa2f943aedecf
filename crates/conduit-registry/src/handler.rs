//! The handler interface every capability body implements.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use conduit_protocol::mcp::{ClientInfo, Root};
use conduit_protocol::schema::{self, SchemaError, ValidationMode};
use conduit_types::{CapabilityDescriptor, CapabilityKind};

/// Named arguments of one call.
pub type Arguments = Map<String, Value>;

/// Read-only facts established by the handshake.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Who connected, if they said.
    pub client_info: Option<ClientInfo>,
    /// Protocol version the client asked for.
    pub protocol_version: Option<String>,
    /// Roots the client scoped the session to.
    pub client_roots: Vec<Root>,
    /// Whether the client answers `sampling/createMessage`.
    pub sampling_supported: bool,
}

/// Everything a handler receives for one call.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Capability family.
    pub kind: CapabilityKind,
    /// Registered name.
    pub name: String,
    /// Arguments from the request (empty for resources).
    pub arguments: Arguments,
    /// Variables bound by the URI template (resources only).
    pub bindings: BTreeMap<String, String>,
    /// The URI that was read (resources only).
    pub uri: Option<String>,
    /// Handshake state.
    pub session: Arc<SessionContext>,
}

impl Invocation {
    /// A string argument, if present and a string.
    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }

    /// A string argument that must be present.
    pub fn required_str(&self, name: &str) -> Result<&str, HandlerFault> {
        self.str_arg(name)
            .ok_or_else(|| HandlerFault::MissingArgument(name.to_string()))
    }

    /// A URI-bound variable.
    pub fn binding(&self, name: &str) -> Result<&str, HandlerFault> {
        self.bindings
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| HandlerFault::MissingArgument(name.to_string()))
    }
}

/// Any failure raised inside a handler body.
#[derive(Debug, Error)]
pub enum HandlerFault {
    /// A plain failure message.
    #[error("{0}")]
    Failed(String),
    /// An argument the handler needs is missing or empty.
    #[error("missing argument: {0}")]
    MissingArgument(String),
    /// File-system failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Anything else.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerFault {
    /// A plain failure message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wraps any error.
    pub fn other(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(e))
    }
}

/// A question the handler wants the remote peer to answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingRequest {
    /// User-role prompt text.
    pub prompt: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl SamplingRequest {
    /// A request with default limits.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: 512,
        }
    }
}

/// The rest of a handler, run once the peer answers a sampling request.
#[async_trait]
pub trait Continuation: Send {
    /// Resumes the handler with the peer's reply text.
    async fn resume(self: Box<Self>, reply: String) -> Result<HandlerOutput, HandlerFault>;
}

struct FnContinuation<F>(F);

#[async_trait]
impl<F> Continuation for FnContinuation<F>
where
    F: FnOnce(String) -> Result<HandlerOutput, HandlerFault> + Send,
{
    async fn resume(self: Box<Self>, reply: String) -> Result<HandlerOutput, HandlerFault> {
        (self.0)(reply)
    }
}

/// What a handler returns.
pub enum HandlerOutput {
    /// One text item.
    Text(String),
    /// Serialised as a single text item holding a JSON array.
    TextList(Vec<String>),
    /// Serialised as a single text item holding pretty JSON.
    Json(Value),
    /// One embedded resource item.
    Resource {
        uri: String,
        mime_type: Option<String>,
        text: String,
    },
    /// Suspend: ask the peer, then continue with `resume`.
    NeedsInput {
        request: SamplingRequest,
        resume: Box<dyn Continuation>,
    },
}

impl HandlerOutput {
    /// Suspends with a synchronous continuation.
    pub fn needs_input<F>(request: SamplingRequest, resume: F) -> Self
    where
        F: FnOnce(String) -> Result<HandlerOutput, HandlerFault> + Send + 'static,
    {
        Self::NeedsInput {
            request,
            resume: Box::new(FnContinuation(resume)),
        }
    }
}

impl fmt::Debug for HandlerOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Self::TextList(l) => f.debug_tuple("TextList").field(l).finish(),
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Self::Resource { uri, mime_type, .. } => f
                .debug_struct("Resource")
                .field("uri", uri)
                .field("mime_type", mime_type)
                .finish_non_exhaustive(),
            Self::NeedsInput { request, .. } => f
                .debug_struct("NeedsInput")
                .field("request", request)
                .finish_non_exhaustive(),
        }
    }
}

/// A capability body: validated, then invoked once per request.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Checks arguments before invocation. Defaults to the descriptor's schema.
    fn validate(
        &self,
        descriptor: &CapabilityDescriptor,
        arguments: &Value,
        mode: ValidationMode,
    ) -> Result<(), SchemaError> {
        match descriptor.input_schema() {
            Some(schema) => schema::validate(&schema, arguments, mode),
            None => Ok(()),
        }
    }

    /// Runs the body.
    async fn invoke(&self, invocation: Invocation) -> Result<HandlerOutput, HandlerFault>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> CapabilityHandler for FnHandler<F>
where
    F: Fn(Invocation) -> Result<HandlerOutput, HandlerFault> + Send + Sync,
{
    async fn invoke(&self, invocation: Invocation) -> Result<HandlerOutput, HandlerFault> {
        (self.0)(invocation)
    }
}

/// Wraps a synchronous closure as a handler.
pub fn from_fn<F>(f: F) -> Arc<dyn CapabilityHandler>
where
    F: Fn(Invocation) -> Result<HandlerOutput, HandlerFault> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}
