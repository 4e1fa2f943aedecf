//! The capability dispatcher.
//!
//! Pipeline: resolve → validate → invoke (under a deadline, on its own
//! task) → wrap. Every failure along the way becomes a
//! [`CapabilityResponse::Failure`]; nothing a handler does can unwind
//! into the caller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use conduit_protocol::schema::ValidationMode;
use conduit_registry::{
    CapabilityHandler, CapabilityRegistry, Continuation, HandlerFault, HandlerOutput, Invocation,
    SamplingRequest, SessionContext,
};
use conduit_types::{CapabilityKind, CapabilityResponse, ContentItem};

use crate::error::DispatchError;

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Knobs the dispatcher reads on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Deadline for one handler invocation; `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// How much of the declared schema is enforced.
    pub validation: ValidationMode,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            validation: ValidationMode::Strict,
        }
    }
}

/// One inbound capability request.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityRequest {
    /// Capability family.
    pub kind: CapabilityKind,
    /// Name for tools and prompts, URI for resources.
    pub target: String,
    /// Named arguments (a JSON object, or null for none).
    pub arguments: Value,
}

impl CapabilityRequest {
    /// A `tools/call`.
    pub fn tool(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            kind: CapabilityKind::Tool,
            target: name.into(),
            arguments,
        }
    }

    /// A `resources/read`.
    pub fn resource(uri: impl Into<String>) -> Self {
        Self {
            kind: CapabilityKind::Resource,
            target: uri.into(),
            arguments: Value::Null,
        }
    }

    /// A `prompts/get`.
    pub fn prompt(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            kind: CapabilityKind::Prompt,
            target: name.into(),
            arguments,
        }
    }
}

/// What a dispatch ended with.
#[derive(Debug)]
pub enum Dispatch {
    /// A final response.
    Complete(CapabilityResponse),
    /// The handler is waiting on the peer; see [`Dispatcher::resume`].
    Suspended(PendingSampling),
}

impl Dispatch {
    /// The response, if the dispatch completed.
    pub fn into_response(self) -> Option<CapabilityResponse> {
        match self {
            Self::Complete(r) => Some(r),
            Self::Suspended(_) => None,
        }
    }
}

/// Identifies the capability a result belongs to.
#[derive(Debug, Clone)]
struct Target {
    kind: CapabilityKind,
    name: String,
    uri: Option<String>,
    mime_type: Option<String>,
}

/// A handler suspended on a sampling round-trip.
pub struct PendingSampling {
    target: Target,
    request: SamplingRequest,
    resume: Box<dyn Continuation>,
}

impl PendingSampling {
    /// The question for the peer.
    pub fn request(&self) -> &SamplingRequest {
        &self.request
    }

    /// Kind of the suspended capability.
    pub fn kind(&self) -> CapabilityKind {
        self.target.kind
    }

    /// Name of the suspended capability.
    pub fn name(&self) -> &str {
        &self.target.name
    }
}

impl fmt::Debug for PendingSampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSampling")
            .field("target", &self.target)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Routes capability requests to registered handlers.
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
    options: DispatchOptions,
}

impl Dispatcher {
    /// Creates a dispatcher over a frozen registry.
    pub fn new(registry: Arc<CapabilityRegistry>, options: DispatchOptions) -> Self {
        Self { registry, options }
    }

    /// The registry being dispatched against.
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Active options.
    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Handles one request.
    pub async fn handle(
        &self,
        request: CapabilityRequest,
        session: Arc<SessionContext>,
    ) -> Dispatch {
        let kind = request.kind;
        let target = request.target.clone();
        match self.try_handle(request, session).await {
            Ok(dispatch) => dispatch,
            Err(e) => {
                warn!(%kind, %target, error = %e, "capability request failed");
                Dispatch::Complete(e.into_response())
            }
        }
    }

    /// Resumes a suspended handler with the peer's reply.
    ///
    /// `Err` carries the peer's error message; the continuation is
    /// dropped and the call fails.
    pub async fn resume(&self, pending: PendingSampling, reply: Result<String, String>) -> Dispatch {
        let PendingSampling { target, resume, .. } = pending;
        let result = match reply {
            Ok(text) => {
                debug!(kind = %target.kind, name = %target.name, "resuming after sampling");
                self.run(&target, resume.resume(text)).await
            }
            Err(message) => Err(DispatchError::Fault {
                kind: target.kind,
                name: target.name.clone(),
                cause: format!("sampling failed: {message}"),
            }),
        };
        // Resumption only happens when sampling was offered, so a
        // second NeedsInput may suspend again.
        match result.and_then(|output| finish(target.clone(), output, true)) {
            Ok(dispatch) => dispatch,
            Err(e) => {
                warn!(kind = %target.kind, name = %target.name, error = %e, "resumed call failed");
                Dispatch::Complete(e.into_response())
            }
        }
    }

    /// Fails a suspended handler whose sampling reply never came.
    pub fn expire(&self, pending: PendingSampling, after: Duration) -> Dispatch {
        let PendingSampling { target, .. } = pending;
        let e = DispatchError::Timeout {
            kind: target.kind,
            name: target.name,
            after,
        };
        warn!(error = %e, "sampling reply did not arrive");
        Dispatch::Complete(e.into_response())
    }

    async fn try_handle(
        &self,
        request: CapabilityRequest,
        session: Arc<SessionContext>,
    ) -> Result<Dispatch, DispatchError> {
        let CapabilityRequest {
            kind,
            target: identifier,
            arguments,
        } = request;

        // 1. Resolve
        let resolved = self
            .registry
            .resolve(kind, &identifier)
            .map_err(|_| DispatchError::NotFound {
                kind,
                name: identifier.clone(),
            })?;
        let descriptor = resolved.descriptor;
        let invalid = |detail: String| DispatchError::InvalidArguments {
            kind,
            name: descriptor.name.clone(),
            detail,
        };

        // 2. Validate
        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            Value::Object(map) => Value::Object(map),
            _ => return Err(invalid("arguments must be an object".to_string())),
        };
        resolved
            .handler
            .validate(descriptor, &arguments, self.options.validation)
            .map_err(|e| invalid(e.detail().to_string()))?;

        // 3. Invoke
        let target = Target {
            kind,
            name: descriptor.name.clone(),
            uri: (kind == CapabilityKind::Resource).then(|| identifier.clone()),
            mime_type: descriptor.mime_type().map(str::to_string),
        };
        let invocation = Invocation {
            kind,
            name: descriptor.name.clone(),
            arguments: match arguments {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            bindings: resolved.bindings,
            uri: target.uri.clone(),
            session: Arc::clone(&session),
        };
        debug!(%kind, name = %target.name, "invoking handler");
        let handler: Arc<dyn CapabilityHandler> = Arc::clone(resolved.handler);
        let output = self
            .run(&target, async move { handler.invoke(invocation).await })
            .await?;

        // 4. Wrap
        finish(target, output, session.sampling_supported)
    }

    /// Runs handler work on its own task, under the request deadline.
    async fn run<F>(&self, target: &Target, work: F) -> Result<HandlerOutput, DispatchError>
    where
        F: std::future::Future<Output = Result<HandlerOutput, HandlerFault>> + Send + 'static,
    {
        let mut task = tokio::spawn(work);
        let joined = match self.options.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) => joined,
                Err(_elapsed) => {
                    task.abort();
                    warn!(kind = %target.kind, name = %target.name, ?limit, "handler timed out");
                    return Err(DispatchError::Timeout {
                        kind: target.kind,
                        name: target.name.clone(),
                        after: limit,
                    });
                }
            },
            None => task.await,
        };

        let fault = |cause: String| DispatchError::Fault {
            kind: target.kind,
            name: target.name.clone(),
            cause,
        };
        match joined {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(handler_fault)) => Err(fault(handler_fault.to_string())),
            Err(join_err) if join_err.is_panic() => Err(fault("handler panicked".to_string())),
            Err(join_err) => Err(fault(join_err.to_string())),
        }
    }
}

/// Turns handler output into a dispatch result.
fn finish(
    target: Target,
    output: HandlerOutput,
    sampling_supported: bool,
) -> Result<Dispatch, DispatchError> {
    let text = match output {
        HandlerOutput::NeedsInput { request, resume } => {
            if !sampling_supported {
                return Err(DispatchError::SamplingUnsupported {
                    kind: target.kind,
                    name: target.name,
                });
            }
            debug!(kind = %target.kind, name = %target.name, "handler suspended for sampling");
            return Ok(Dispatch::Suspended(PendingSampling {
                target,
                request,
                resume,
            }));
        }
        HandlerOutput::Resource {
            uri,
            mime_type,
            text,
        } => {
            return Ok(success(ContentItem::EmbeddedResource {
                uri,
                mime_type: mime_type.or(target.mime_type),
                text,
            }))
        }
        HandlerOutput::Text(text) => text,
        HandlerOutput::TextList(items) => pretty(&target, &items)?,
        HandlerOutput::Json(value) => pretty(&target, &value)?,
    };

    let item = match (target.kind, target.uri) {
        (CapabilityKind::Resource, Some(uri)) => ContentItem::EmbeddedResource {
            uri,
            mime_type: target.mime_type,
            text,
        },
        _ => ContentItem::Text { text },
    };
    Ok(success(item))
}

fn success(item: ContentItem) -> Dispatch {
    Dispatch::Complete(CapabilityResponse::Success {
        content: vec![item],
    })
}

fn pretty<T: Serialize>(target: &Target, value: &T) -> Result<String, DispatchError> {
    serde_json::to_string_pretty(value).map_err(|e| DispatchError::Fault {
        kind: target.kind,
        name: target.name.clone(),
        cause: format!("result is not serialisable: {e}"),
    })
}
