//! MCP method dispatch functions.
//!
//! Each sub-module handles one family of MCP methods as free functions,
//! keeping `McpHandler` itself thin (struct + routing only).

pub(crate) mod initialize;
pub(crate) mod prompts;
pub(crate) mod resources;
pub(crate) mod tools;

use serde::de::DeserializeOwned;
use serde_json::Value;

use conduit_protocol::{error_codes, RequestId};
use conduit_types::ErrorKind;

use crate::handler::JsonRpcOutput;

/// Parses required method params.
pub(crate) fn parse_params<T: DeserializeOwned>(
    id: &RequestId,
    method: &str,
    params: &Option<Value>,
) -> Result<T, JsonRpcOutput> {
    let Some(p) = params else {
        return Err(JsonRpcOutput::error(
            id.clone(),
            error_codes::INVALID_PARAMS,
            format!("{method} requires params"),
        ));
    };
    serde_json::from_value(p.clone()).map_err(|e| {
        JsonRpcOutput::error(
            id.clone(),
            error_codes::INVALID_PARAMS,
            format!("invalid {method} params: {e}"),
        )
    })
}

/// JSON-RPC code for a failed resource read or prompt get.
pub(crate) fn failure_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NotFound | ErrorKind::InvalidInput => error_codes::INVALID_PARAMS,
        _ => error_codes::INTERNAL_ERROR,
    }
}
