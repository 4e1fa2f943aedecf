//! Handles the `initialize` MCP method.

use serde_json::Value;
use tracing::{error, info};

use conduit_protocol::mcp::{InitializeParams, InitializeResult, PROTOCOL_VERSION};
use conduit_protocol::{error_codes, JsonRpcResponse, RequestId};
use conduit_registry::SessionContext;

use crate::handler::{JsonRpcOutput, McpHandler, Step};
use crate::session::SessionState;

/// Performs the handshake and moves the session to `Ready`.
///
/// Bad client params are answered with an error and the session stays
/// `Uninitialized`. A failure to serialise our own capabilities aborts
/// the connection.
pub(crate) fn handle_initialize(
    handler: &McpHandler,
    id: RequestId,
    params: &Option<Value>,
) -> Step {
    if handler.session().state() == SessionState::Ready {
        return Step::Respond(JsonRpcOutput::error(
            id,
            error_codes::INVALID_REQUEST,
            "server already initialized",
        ));
    }

    let context = match params {
        Some(p) => match serde_json::from_value::<InitializeParams>(p.clone()) {
            Ok(p) => SessionContext {
                sampling_supported: p.capabilities.sampling.is_some(),
                client_info: Some(p.client_info),
                protocol_version: Some(p.protocol_version),
                client_roots: p.roots,
            },
            Err(e) => {
                return Step::Respond(JsonRpcOutput::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("invalid initialize params: {e}"),
                ));
            }
        },
        None => SessionContext::default(),
    };

    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: handler.capabilities(),
        server_info: handler.server_info().clone(),
    };
    let result = match serde_json::to_value(result) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "cannot serialise server capabilities");
            return Step::Abort {
                output: JsonRpcOutput::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
                reason: format!("capabilities are not serialisable: {e}"),
            };
        }
    };

    let client = context
        .client_info
        .as_ref()
        .map(|c| format!("{} {}", c.name, c.version))
        .unwrap_or_else(|| "unknown".to_string());
    let sampling = context.sampling_supported;
    let roots = context.client_roots.len();
    if !handler.session().establish(context) {
        return Step::Respond(JsonRpcOutput::error(
            id,
            error_codes::INVALID_REQUEST,
            "server already initialized",
        ));
    }
    info!(%client, sampling, roots, "session ready");

    Step::Respond(JsonRpcOutput::Success(JsonRpcResponse::success(id, result)))
}
