//! Handles the `prompts/list` and `prompts/get` MCP methods.

use serde_json::Value;

use conduit_protocol::mcp::{
    methods, McpPromptDefinition, PromptMessage, PromptsGetParams, PromptsGetResult,
    PromptsListResult, Role, ToolContent,
};
use conduit_protocol::RequestId;
use conduit_registry::CapabilityRegistry;
use conduit_types::{CapabilityKind, CapabilityResponse, CapabilitySchema};

use crate::dispatch::{failure_code, parse_params};
use crate::dispatcher::CapabilityRequest;
use crate::handler::JsonRpcOutput;

/// Handles the `prompts/list` request.
pub(crate) fn handle_prompts_list(id: RequestId, registry: &CapabilityRegistry) -> JsonRpcOutput {
    let prompts = registry
        .list_all(CapabilityKind::Prompt)
        .into_iter()
        .map(|d| McpPromptDefinition {
            name: d.name.clone(),
            description: (!d.description.is_empty()).then(|| d.description.clone()),
            arguments: match &d.schema {
                CapabilitySchema::Arguments(args) => args.clone(),
                _ => Vec::new(),
            },
        })
        .collect();
    JsonRpcOutput::result(id, PromptsListResult { prompts })
}

/// Parses `prompts/get` params into a capability request.
pub(crate) fn parse_get(
    id: &RequestId,
    params: &Option<Value>,
) -> Result<CapabilityRequest, JsonRpcOutput> {
    let p: PromptsGetParams = parse_params(id, methods::PROMPTS_GET, params)?;
    Ok(CapabilityRequest::prompt(p.name, Value::Object(p.arguments)))
}

/// The description echoed back by `prompts/get`.
pub(crate) fn description_of(registry: &CapabilityRegistry, name: &str) -> Option<String> {
    registry
        .resolve(CapabilityKind::Prompt, name)
        .ok()
        .map(|r| r.descriptor.description.clone())
        .filter(|d| !d.is_empty())
}

/// Renders a get: each content item becomes one user message.
pub(crate) fn render_get(
    id: RequestId,
    description: Option<String>,
    response: CapabilityResponse,
) -> JsonRpcOutput {
    match response {
        CapabilityResponse::Success { content } => {
            let messages = content
                .into_iter()
                .map(|item| PromptMessage {
                    role: Role::User,
                    content: ToolContent::from(item),
                })
                .collect();
            JsonRpcOutput::result(
                id,
                PromptsGetResult {
                    description,
                    messages,
                },
            )
        }
        CapabilityResponse::Failure { kind, message } => {
            JsonRpcOutput::error(id, failure_code(kind), message)
        }
    }
}
