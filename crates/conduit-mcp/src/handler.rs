//! MCP request handler: routes JSON-RPC methods onto the dispatcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use conduit_protocol::mcp::{
    methods, CreateMessageParams, CreateMessageResult, PromptCapability, ResourceCapability,
    Role, SamplingMessage, ServerCapabilities, ServerInfo, ToolCapability, ToolContent,
};
use conduit_protocol::{
    error_codes, JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
use conduit_registry::CapabilityRegistry;
use conduit_types::{CapabilityKind, CapabilityResponse};

use crate::dispatch::{initialize, prompts, resources, tools};
use crate::dispatcher::{CapabilityRequest, Dispatch, DispatchOptions, Dispatcher, PendingSampling};
use crate::session::Session;

/// Serialisable JSON-RPC reply.
#[derive(Debug, Clone)]
pub enum JsonRpcOutput {
    /// A `result` reply.
    Success(JsonRpcResponse),
    /// An `error` reply.
    Error(JsonRpcErrorResponse),
}

impl JsonRpcOutput {
    /// Serialises the reply to a single JSON line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Success(r) => serde_json::to_string(r),
            Self::Error(e) => serde_json::to_string(e),
        }
    }

    /// The id the reply answers.
    pub fn id(&self) -> &RequestId {
        match self {
            Self::Success(r) => &r.id,
            Self::Error(e) => &e.id,
        }
    }

    /// Whether this is an error reply.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Serialises `result` into a success reply, or an internal error.
    pub(crate) fn result<T: Serialize>(id: RequestId, result: T) -> Self {
        match serde_json::to_value(result) {
            Ok(v) => Self::Success(JsonRpcResponse::success(id, v)),
            Err(e) => Self::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
        }
    }

    pub(crate) fn error(id: RequestId, code: i32, message: impl Into<String>) -> Self {
        Self::Error(JsonRpcErrorResponse::error(id, code, message))
    }
}

/// The peer's answer to an outbound sampling request.
pub type SamplingReply = Result<Value, JsonRpcError>;

/// What the server loop must do next for one inbound request.
#[derive(Debug)]
pub enum Step {
    /// Write this reply.
    Respond(JsonRpcOutput),
    /// Write [`PendingCall::outbound`] and wait for its reply.
    Sample(PendingCall),
    /// Write this reply, then stop serving: the handshake failed on our side.
    Abort {
        output: JsonRpcOutput,
        reason: String,
    },
}

/// Which method a suspended call will eventually answer.
#[derive(Debug, Clone)]
pub(crate) enum CallMethod {
    ToolsCall,
    ResourcesRead { uri: String },
    PromptsGet { description: Option<String> },
}

/// An inbound request parked on a sampling round-trip.
#[derive(Debug)]
pub struct PendingCall {
    request_id: RequestId,
    method: CallMethod,
    outbound: JsonRpcRequest,
    pending: PendingSampling,
}

impl PendingCall {
    /// The `sampling/createMessage` request to send to the peer.
    pub fn outbound(&self) -> &JsonRpcRequest {
        &self.outbound
    }

    /// Id the peer's reply will carry.
    pub fn sampling_id(&self) -> &RequestId {
        &self.outbound.id
    }

    /// Id of the inbound request being answered.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }
}

/// Handles MCP JSON-RPC requests for one connection.
pub struct McpHandler {
    server_info: ServerInfo,
    dispatcher: Dispatcher,
    session: Session,
    next_sampling_id: AtomicU64,
}

impl McpHandler {
    /// Creates a handler serving `registry` as `name`/`version`.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        registry: Arc<CapabilityRegistry>,
        options: DispatchOptions,
    ) -> Self {
        Self {
            server_info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            dispatcher: Dispatcher::new(registry, options),
            session: Session::new(),
            next_sampling_id: AtomicU64::new(1),
        }
    }

    /// Name and version advertised at handshake.
    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// The session state machine.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The underlying registry.
    pub fn registry(&self) -> &CapabilityRegistry {
        self.dispatcher.registry()
    }

    /// Deadline for one capability request, sampling waits included.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.dispatcher.options().request_timeout
    }

    /// Capability families advertised at handshake: one per non-empty kind.
    pub fn capabilities(&self) -> ServerCapabilities {
        let registry = self.registry();
        ServerCapabilities {
            tools: registry
                .has(CapabilityKind::Tool)
                .then_some(ToolCapability {}),
            resources: registry
                .has(CapabilityKind::Resource)
                .then_some(ResourceCapability {}),
            prompts: registry
                .has(CapabilityKind::Prompt)
                .then_some(PromptCapability {}),
        }
    }

    /// Routes one request.
    pub async fn dispatch(&self, request: &JsonRpcRequest) -> Step {
        let id = request.id.clone();
        let params = &request.params;

        if request.method == methods::INITIALIZE {
            return initialize::handle_initialize(self, id, params);
        }
        let Some(session) = self.session.context() else {
            debug!(method = %request.method, "rejected before handshake");
            return Step::Respond(JsonRpcOutput::error(
                id,
                error_codes::SERVER_NOT_INITIALIZED,
                "server not initialized",
            ));
        };

        let (call, method) = match request.method.as_str() {
            methods::PING => {
                return Step::Respond(JsonRpcOutput::result(id, serde_json::json!({})))
            }
            methods::TOOLS_LIST => {
                return Step::Respond(tools::handle_tools_list(id, self.registry()))
            }
            methods::RESOURCES_LIST => {
                return Step::Respond(resources::handle_resources_list(id, self.registry()))
            }
            methods::RESOURCES_TEMPLATES_LIST => {
                return Step::Respond(resources::handle_templates_list(id, self.registry()))
            }
            methods::PROMPTS_LIST => {
                return Step::Respond(prompts::handle_prompts_list(id, self.registry()))
            }
            methods::TOOLS_CALL => match tools::parse_call(&id, params) {
                Ok(call) => (call, CallMethod::ToolsCall),
                Err(out) => return Step::Respond(out),
            },
            methods::RESOURCES_READ => match resources::parse_read(&id, params) {
                Ok(uri) => (
                    CapabilityRequest::resource(uri.clone()),
                    CallMethod::ResourcesRead { uri },
                ),
                Err(out) => return Step::Respond(out),
            },
            methods::PROMPTS_GET => match prompts::parse_get(&id, params) {
                Ok(call) => {
                    let description = prompts::description_of(self.registry(), &call.target);
                    (call, CallMethod::PromptsGet { description })
                }
                Err(out) => return Step::Respond(out),
            },
            other => {
                return Step::Respond(JsonRpcOutput::error(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("unknown method: {other}"),
                ))
            }
        };

        let dispatch = self.dispatcher.handle(call, session).await;
        self.settle(id, method, dispatch)
    }

    /// Continues a parked call with the peer's sampling reply.
    pub async fn resume(&self, call: PendingCall, reply: SamplingReply) -> Step {
        let PendingCall {
            request_id,
            method,
            pending,
            ..
        } = call;
        let reply = match reply {
            Ok(value) => serde_json::from_value::<CreateMessageResult>(value)
                .map(|r| r.text().to_string())
                .map_err(|e| format!("invalid sampling reply: {e}")),
            Err(e) => Err(e.message),
        };
        let dispatch = self.dispatcher.resume(pending, reply).await;
        self.settle(request_id, method, dispatch)
    }

    /// Fails a parked call whose sampling reply did not arrive in `after`.
    pub fn expire(&self, call: PendingCall, after: Duration) -> Step {
        let PendingCall {
            request_id,
            method,
            pending,
            ..
        } = call;
        let dispatch = self.dispatcher.expire(pending, after);
        self.settle(request_id, method, dispatch)
    }

    /// Handles a notification. Notifications never produce a reply.
    pub fn handle_notification(&self, notification: &JsonRpcNotification) {
        match notification.method.as_str() {
            methods::NOTIFICATIONS_INITIALIZED => info!("client finished initialization"),
            methods::NOTIFICATIONS_CANCELLED => {
                debug!(params = ?notification.params, "cancellation noted; requests run to completion or deadline")
            }
            other => debug!(method = %other, "ignoring notification"),
        }
    }

    fn settle(&self, id: RequestId, method: CallMethod, dispatch: Dispatch) -> Step {
        match dispatch {
            Dispatch::Complete(response) => Step::Respond(render(id, &method, response)),
            Dispatch::Suspended(pending) => self.suspend(id, method, pending),
        }
    }

    fn suspend(&self, request_id: RequestId, method: CallMethod, pending: PendingSampling) -> Step {
        let n = self.next_sampling_id.fetch_add(1, Ordering::Relaxed);
        let sampling_id = RequestId::String(format!("conduit-sampling-{n}"));
        let question = pending.request();
        let params = CreateMessageParams {
            messages: vec![SamplingMessage {
                role: Role::User,
                content: ToolContent::Text {
                    text: question.prompt.clone(),
                },
            }],
            system_prompt: question.system_prompt.clone(),
            max_tokens: question.max_tokens,
        };
        match serde_json::to_value(params) {
            Ok(params) => {
                debug!(id = %request_id, sampling_id = %sampling_id, name = %pending.name(), "requesting sampling");
                Step::Sample(PendingCall {
                    request_id,
                    method,
                    outbound: JsonRpcRequest::new(
                        sampling_id,
                        methods::SAMPLING_CREATE_MESSAGE,
                        Some(params),
                    ),
                    pending,
                })
            }
            Err(e) => Step::Respond(JsonRpcOutput::error(
                request_id,
                error_codes::INTERNAL_ERROR,
                e.to_string(),
            )),
        }
    }
}

fn render(id: RequestId, method: &CallMethod, response: CapabilityResponse) -> JsonRpcOutput {
    match method {
        CallMethod::ToolsCall => tools::render_call(id, response),
        CallMethod::ResourcesRead { uri } => resources::render_read(id, uri, response),
        CallMethod::PromptsGet { description } => {
            prompts::render_get(id, description.clone(), response)
        }
    }
}
