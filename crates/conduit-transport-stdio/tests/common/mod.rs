//! Shared fixtures for the server loop tests.

#![allow(dead_code)]

use std::sync::Arc;

use conduit_mcp::DispatchOptions;
use conduit_registry::{from_fn, CapabilityRegistry, HandlerFault, HandlerOutput, SamplingRequest};
use conduit_transport_stdio::{McpHandler, McpServer, StdioTransport};
use conduit_types::{ArgumentSpec, CapabilityDescriptor};
use serde_json::Value;

pub const INIT: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#;

pub const INIT_WITH_SAMPLING: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{"sampling":{}},"clientInfo":{"name":"t","version":"1"}}}"#;

pub fn make_handler() -> McpHandler {
    make_handler_with(DispatchOptions::default())
}

pub fn make_handler_with(options: DispatchOptions) -> McpHandler {
    let mut b = CapabilityRegistry::builder();
    b.register(
        CapabilityDescriptor::tool(
            "echo",
            "Echo",
            &[ArgumentSpec::required("text", "string", "")],
        ),
        from_fn(|inv| Ok(HandlerOutput::Text(inv.required_str("text")?.to_string()))),
    )
    .expect("echo")
    .register(
        CapabilityDescriptor::tool("boom", "Fails", &[]),
        from_fn(|_| Err(HandlerFault::failed("kaput"))),
    )
    .expect("boom")
    .register(
        CapabilityDescriptor::tool("ask", "Samples", &[]),
        from_fn(|_| {
            Ok(HandlerOutput::needs_input(
                SamplingRequest::new("Should I?"),
                |reply| Ok(HandlerOutput::Text(format!("client said {reply}"))),
            ))
        }),
    )
    .expect("ask");
    McpHandler::new(
        "test-server",
        "0.1.0",
        Arc::new(b.build()),
        options,
    )
}

/// Runs the server over `lines` and returns every output line as JSON.
pub async fn run_lines(lines: &[&str]) -> Vec<Value> {
    let mut input = lines.join("\n");
    input.push('\n');
    let reader = tokio::io::BufReader::new(input.as_bytes());
    let mut output = Vec::new();
    let transport = StdioTransport::new(reader, &mut output);
    let mut server = McpServer::new(transport, make_handler());
    server.run().await.expect("run");
    String::from_utf8(output)
        .expect("utf8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect()
}
