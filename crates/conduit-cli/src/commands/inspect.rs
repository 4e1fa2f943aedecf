//! `conduit inspect` command.
//!
//! Performs an in-process handshake and prints every listing method's
//! result, exactly as a client would see them.

use clap::Args;
use serde_json::{json, Map, Value};

use conduit_config::ConduitConfig;
use conduit_mcp::{McpHandler, Step};
use conduit_protocol::mcp::methods;
use conduit_protocol::{JsonRpcRequest, RequestId};
use conduit_servers::ServerKind;

use crate::{output, shared};

/// Inspect a server's capabilities.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Server to inspect.
    pub server: ServerKind,
}

const LISTINGS: [&str; 4] = [
    methods::TOOLS_LIST,
    methods::RESOURCES_LIST,
    methods::RESOURCES_TEMPLATES_LIST,
    methods::PROMPTS_LIST,
];

/// Executes the inspect command.
pub async fn execute(args: &InspectArgs, config: &ConduitConfig) -> anyhow::Result<()> {
    let handler = shared::build_handler(args.server, config)?;
    let report = describe(&handler).await?;
    output::print_json(&report)
}

/// Handshake result plus every listing, keyed by method.
pub(crate) async fn describe(handler: &McpHandler) -> anyhow::Result<Value> {
    let init = json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {},
        "clientInfo": {"name": "conduit-inspect", "version": env!("CARGO_PKG_VERSION")}
    });
    let mut report = Map::new();
    report.insert(
        methods::INITIALIZE.to_string(),
        request(handler, 0, methods::INITIALIZE, Some(init)).await?,
    );
    for (id, method) in (1..).zip(LISTINGS) {
        report.insert(method.to_string(), request(handler, id, method, None).await?);
    }
    Ok(Value::Object(report))
}

async fn request(
    handler: &McpHandler,
    id: i64,
    method: &str,
    params: Option<Value>,
) -> anyhow::Result<Value> {
    let step = handler
        .dispatch(&JsonRpcRequest::new(RequestId::Number(id), method, params))
        .await;
    let output = match step {
        Step::Respond(output) => output,
        Step::Abort { reason, .. } => anyhow::bail!("{method} failed: {reason}"),
        Step::Sample(_) => anyhow::bail!("{method} unexpectedly requested sampling"),
    };
    let reply: Value = serde_json::from_str(&output.to_json()?)?;
    match reply.get("result") {
        Some(result) => Ok(result.clone()),
        None => anyhow::bail!("{method} failed: {}", reply["error"]),
    }
}
