//! Handles the `resources/*` MCP methods.

use serde_json::Value;

use conduit_protocol::mcp::{
    methods, McpResourceDefinition, McpResourceTemplate, ResourceContents,
    ResourceTemplatesListResult, ResourcesListResult, ResourcesReadParams, ResourcesReadResult,
};
use conduit_protocol::RequestId;
use conduit_registry::{CapabilityRegistry, UriTemplate};
use conduit_types::{CapabilityDescriptor, CapabilityKind, CapabilityResponse, ContentItem};

use crate::dispatch::{failure_code, parse_params};
use crate::handler::JsonRpcOutput;

fn described(d: &CapabilityDescriptor) -> Option<String> {
    (!d.description.is_empty()).then(|| d.description.clone())
}

/// Handles `resources/list`: every resource, addressed by its template.
pub(crate) fn handle_resources_list(
    id: RequestId,
    registry: &CapabilityRegistry,
) -> JsonRpcOutput {
    let resources = registry
        .list_all(CapabilityKind::Resource)
        .into_iter()
        .map(|d| McpResourceDefinition {
            uri: d.uri_template().unwrap_or_default().to_string(),
            name: d.name.clone(),
            description: described(d),
            mime_type: d.mime_type().map(str::to_string),
        })
        .collect();
    JsonRpcOutput::result(id, ResourcesListResult { resources })
}

/// Handles `resources/templates/list`: resources with URI variables.
pub(crate) fn handle_templates_list(
    id: RequestId,
    registry: &CapabilityRegistry,
) -> JsonRpcOutput {
    let resource_templates = registry
        .list_all(CapabilityKind::Resource)
        .into_iter()
        .filter_map(|d| {
            let raw = d.uri_template()?;
            let concrete = UriTemplate::parse(raw).map(|t| t.is_concrete()).unwrap_or(true);
            (!concrete).then(|| McpResourceTemplate {
                uri_template: raw.to_string(),
                name: d.name.clone(),
                description: described(d),
                mime_type: d.mime_type().map(str::to_string),
            })
        })
        .collect();
    JsonRpcOutput::result(id, ResourceTemplatesListResult { resource_templates })
}

/// Parses `resources/read` params into the URI to read.
pub(crate) fn parse_read(id: &RequestId, params: &Option<Value>) -> Result<String, JsonRpcOutput> {
    let p: ResourcesReadParams = parse_params(id, methods::RESOURCES_READ, params)?;
    Ok(p.uri)
}

/// Renders a read. Failures become JSON-RPC errors.
pub(crate) fn render_read(id: RequestId, uri: &str, response: CapabilityResponse) -> JsonRpcOutput {
    match response {
        CapabilityResponse::Success { content } => {
            let contents = content
                .into_iter()
                .map(|item| match item {
                    ContentItem::EmbeddedResource {
                        uri,
                        mime_type,
                        text,
                    } => ResourceContents {
                        uri,
                        mime_type,
                        text,
                    },
                    ContentItem::Text { text } => ResourceContents {
                        uri: uri.to_string(),
                        mime_type: None,
                        text,
                    },
                })
                .collect();
            JsonRpcOutput::result(id, ResourcesReadResult { contents })
        }
        CapabilityResponse::Failure { kind, message } => {
            JsonRpcOutput::error(id, failure_code(kind), message)
        }
    }
}
