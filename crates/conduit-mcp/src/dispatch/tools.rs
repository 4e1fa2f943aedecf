//! Handles the `tools/list` and `tools/call` MCP methods.

use serde_json::{json, Value};

use conduit_protocol::mcp::{
    methods, McpToolDefinition, ToolContent, ToolsCallParams, ToolsCallResult, ToolsListResult,
};
use conduit_protocol::RequestId;
use conduit_registry::CapabilityRegistry;
use conduit_types::{CapabilityKind, CapabilityResponse};

use crate::dispatch::parse_params;
use crate::dispatcher::CapabilityRequest;
use crate::handler::JsonRpcOutput;

/// Handles the `tools/list` request.
pub(crate) fn handle_tools_list(id: RequestId, registry: &CapabilityRegistry) -> JsonRpcOutput {
    let tools = registry
        .list_all(CapabilityKind::Tool)
        .into_iter()
        .map(|d| McpToolDefinition {
            name: d.name.clone(),
            description: (!d.description.is_empty()).then(|| d.description.clone()),
            input_schema: d
                .input_schema()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        })
        .collect();

    JsonRpcOutput::result(
        id,
        ToolsListResult {
            tools,
            next_cursor: None,
        },
    )
}

/// Parses `tools/call` params into a capability request.
pub(crate) fn parse_call(
    id: &RequestId,
    params: &Option<Value>,
) -> Result<CapabilityRequest, JsonRpcOutput> {
    let p: ToolsCallParams = parse_params(id, methods::TOOLS_CALL, params)?;
    Ok(CapabilityRequest::tool(p.name, p.arguments))
}

/// Renders a dispatch result. Failures stay in-band as `isError: true`.
pub(crate) fn render_call(id: RequestId, response: CapabilityResponse) -> JsonRpcOutput {
    let result = match response {
        CapabilityResponse::Success { content } => ToolsCallResult {
            content: content.into_iter().map(ToolContent::from).collect(),
            is_error: false,
        },
        CapabilityResponse::Failure { message, .. } => ToolsCallResult {
            content: vec![ToolContent::Text { text: message }],
            is_error: true,
        },
    };
    JsonRpcOutput::result(id, result)
}
