//! Fixtures: an MCP handler driver and a one-shot HTTP stub.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use conduit_mcp::{DispatchOptions, McpHandler, Step};
use conduit_protocol::{JsonRpcRequest, RequestId};
use conduit_servers::DemoServer;

/// A handler for `server`, already past the handshake.
pub async fn ready(server: DemoServer, capabilities: Value) -> McpHandler {
    ready_with(server, json!({ "capabilities": capabilities })).await
}

/// Like [`ready`], with `extra` merged into the `initialize` params.
pub async fn ready_with(server: DemoServer, extra: Value) -> McpHandler {
    let handler = McpHandler::new(
        server.name,
        server.version,
        Arc::new(server.registry),
        DispatchOptions::default(),
    );
    let mut params = json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {},
        "clientInfo": {"name": "servers-test", "version": "1.0"}
    });
    if let (Some(params), Some(extra)) = (params.as_object_mut(), extra.as_object()) {
        params.extend(extra.clone());
    }
    let init = call(&handler, "initialize", params).await;
    assert!(init.get("result").is_some(), "handshake failed: {init}");
    handler
}

/// Dispatches one request that must answer without sampling.
pub async fn call(handler: &McpHandler, method: &str, params: Value) -> Value {
    match handler
        .dispatch(&JsonRpcRequest::new(RequestId::Number(1), method, Some(params)))
        .await
    {
        Step::Respond(out) => serde_json::from_str(&out.to_json().expect("ser")).expect("de"),
        other => panic!("expected a reply, got {other:?}"),
    }
}

/// First content text of a `tools/call` result.
pub fn tool_text(reply: &Value) -> &str {
    reply["result"]["content"][0]["text"].as_str().unwrap_or_default()
}

/// Serves exactly one HTTP request with `status` and `body`; the task
/// yields the raw request (head and body) it received.
pub async fn http_stub(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base_url = format!("http://{}", listener.local_addr().expect("addr"));
    let task = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status} STUB\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.shutdown().await.ok();
        request
    });
    (base_url, task)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let length = text[..head_end]
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
