//! MCP method routing, state machine and sampling tests.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use conduit_mcp::{DispatchOptions, McpHandler, SessionState, Step};
use conduit_protocol::mcp::methods;
use conduit_protocol::{error_codes, JsonRpcError, JsonRpcNotification, JsonRpcRequest, RequestId};
use conduit_registry::{
    from_fn, CapabilityHandler, CapabilityRegistry, HandlerFault, HandlerOutput, Invocation,
    SamplingRequest,
};
use conduit_types::{ArgumentSpec, CapabilityDescriptor, PromptArgument};

struct Sleepy;

#[async_trait::async_trait]
impl CapabilityHandler for Sleepy {
    async fn invoke(&self, _: Invocation) -> Result<HandlerOutput, HandlerFault> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(HandlerOutput::Text("late".into()))
    }
}

fn registry() -> Arc<CapabilityRegistry> {
    let mut b = CapabilityRegistry::builder();
    b.register(
        CapabilityDescriptor::tool(
            "echo",
            "Echo text",
            &[ArgumentSpec::required("text", "string", "")],
        ),
        from_fn(|inv| Ok(HandlerOutput::Text(inv.required_str("text")?.to_string()))),
    )
    .expect("echo")
    .register(
        CapabilityDescriptor::tool("boom", "Always fails", &[]),
        from_fn(|_| Err(HandlerFault::failed("exploded"))),
    )
    .expect("boom")
    .register(
        CapabilityDescriptor::tool("panics", "", &[]),
        from_fn(|_| panic!("handler bug")),
    )
    .expect("panics")
    .register(CapabilityDescriptor::tool("sleepy", "", &[]), Arc::new(Sleepy))
    .expect("sleepy")
    .register(
        CapabilityDescriptor::tool("ask", "Asks the client", &[]),
        from_fn(|_| {
            Ok(HandlerOutput::needs_input(
                SamplingRequest::new("Buy?"),
                |reply| Ok(HandlerOutput::Text(format!("advice: {reply}"))),
            ))
        }),
    )
    .expect("ask")
    .register(
        CapabilityDescriptor::resource("note", "", "note://{slug}", Some("text/plain")),
        from_fn(|inv| Ok(HandlerOutput::Text(format!("note {}", inv.binding("slug")?)))),
    )
    .expect("note")
    .register(
        CapabilityDescriptor::prompt(
            "greet",
            "Greeting",
            vec![PromptArgument::new("who", "Name", true)],
        ),
        from_fn(|inv| Ok(HandlerOutput::Text(format!("Hello {}", inv.required_str("who")?)))),
    )
    .expect("greet");
    Arc::new(b.build())
}

fn handler() -> McpHandler {
    let options = DispatchOptions {
        request_timeout: Some(Duration::from_millis(100)),
        ..DispatchOptions::default()
    };
    McpHandler::new("test-server", "0.0.1", registry(), options)
}

fn rpc(method: &str, id: i64, params: Option<Value>) -> JsonRpcRequest {
    JsonRpcRequest::new(RequestId::Number(id), method, params)
}

async fn call(h: &McpHandler, method: &str, id: i64, params: Option<Value>) -> Value {
    match h.dispatch(&rpc(method, id, params)).await {
        Step::Respond(out) => serde_json::from_str(&out.to_json().expect("ser")).expect("de"),
        other => panic!("expected a reply, got {other:?}"),
    }
}

async fn ready(sampling: bool) -> McpHandler {
    let h = handler();
    let mut caps = json!({});
    if sampling {
        caps = json!({"sampling": {}});
    }
    let v = call(
        &h,
        methods::INITIALIZE,
        0,
        Some(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": caps,
            "clientInfo": {"name": "test-client", "version": "1.0"}
        })),
    )
    .await;
    assert_eq!(v["result"]["serverInfo"]["name"], "test-server");
    h
}

#[tokio::test]
async fn requests_before_handshake_are_rejected() {
    let h = handler();
    let v = call(&h, methods::TOOLS_LIST, 1, None).await;
    assert_eq!(v["error"]["code"], error_codes::SERVER_NOT_INITIALIZED);
    assert_eq!(h.session().state(), SessionState::Uninitialized);
}

#[tokio::test]
async fn initialize_advertises_non_empty_kinds() {
    let h = ready(false).await;
    assert_eq!(h.session().state(), SessionState::Ready);
    let caps = h.capabilities();
    assert!(caps.tools.is_some());
    assert!(caps.resources.is_some());
    assert!(caps.prompts.is_some());
}

#[tokio::test]
async fn second_initialize_is_rejected() {
    let h = ready(false).await;
    let v = call(&h, methods::INITIALIZE, 9, None).await;
    assert_eq!(v["error"]["code"], error_codes::INVALID_REQUEST);
}

#[tokio::test]
async fn invalid_initialize_params_keep_session_uninitialized() {
    let h = handler();
    let v = call(&h, methods::INITIALIZE, 1, Some(json!({"protocolVersion": 123}))).await;
    assert_eq!(v["error"]["code"], error_codes::INVALID_PARAMS);
    assert_eq!(h.session().state(), SessionState::Uninitialized);
}

#[tokio::test]
async fn ping_answers_empty_object() {
    let h = ready(false).await;
    let v = call(&h, methods::PING, 2, None).await;
    assert_eq!(v["result"], json!({}));
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let h = ready(false).await;
    let v = call(&h, "foo/bar", 3, None).await;
    assert_eq!(v["error"]["code"], error_codes::METHOD_NOT_FOUND);
    assert_eq!(v["error"]["message"], "unknown method: foo/bar");
}

#[tokio::test]
async fn tools_list_keeps_registration_order() {
    let h = ready(false).await;
    let v = call(&h, methods::TOOLS_LIST, 4, None).await;
    let names: Vec<&str> = v["result"]["tools"]
        .as_array()
        .expect("tools")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["echo", "boom", "panics", "sleepy", "ask"]);
}

#[tokio::test]
async fn fault_does_not_poison_later_requests() {
    let h = ready(false).await;
    let v = call(&h, methods::TOOLS_CALL, 5, Some(json!({"name": "boom"}))).await;
    assert_eq!(v["result"]["isError"], true);
    assert_eq!(v["result"]["content"][0]["text"], "Error in tool 'boom': exploded");

    let v = call(&h, methods::TOOLS_CALL, 6, Some(json!({"name": "panics"}))).await;
    assert_eq!(v["result"]["isError"], true);
    assert_eq!(
        v["result"]["content"][0]["text"],
        "Error in tool 'panics': handler panicked"
    );

    let v = call(
        &h,
        methods::TOOLS_CALL,
        7,
        Some(json!({"name": "echo", "arguments": {"text": "still here"}})),
    )
    .await;
    assert_eq!(v["result"]["isError"], false);
    assert_eq!(v["result"]["content"][0]["text"], "still here");
}

#[tokio::test]
async fn unknown_tool_failure_names_it() {
    let h = ready(false).await;
    let v = call(&h, methods::TOOLS_CALL, 8, Some(json!({"name": "ghost"}))).await;
    assert_eq!(v["result"]["isError"], true);
    assert_eq!(v["result"]["content"][0]["text"], "Unknown tool: ghost");
}

#[tokio::test]
async fn missing_required_argument_is_a_validation_failure() {
    let h = ready(false).await;
    let v = call(
        &h,
        methods::TOOLS_CALL,
        9,
        Some(json!({"name": "echo", "arguments": {}})),
    )
    .await;
    assert_eq!(
        v["result"]["content"][0]["text"],
        "Invalid arguments for tool 'echo': missing required field: text"
    );
}

#[tokio::test]
async fn slow_handler_times_out() {
    let h = ready(false).await;
    let v = call(&h, methods::TOOLS_CALL, 10, Some(json!({"name": "sleepy"}))).await;
    assert_eq!(v["result"]["isError"], true);
    assert_eq!(
        v["result"]["content"][0]["text"],
        "Error in tool 'sleepy': timed out after 100ms"
    );
}

#[tokio::test]
async fn resource_read_binds_uri_variables() {
    let h = ready(false).await;
    let v = call(
        &h,
        methods::RESOURCES_READ,
        11,
        Some(json!({"uri": "note://shopping-list"})),
    )
    .await;
    let c = &v["result"]["contents"][0];
    assert_eq!(c["uri"], "note://shopping-list");
    assert_eq!(c["mimeType"], "text/plain");
    assert_eq!(c["text"], "note shopping-list");
}

#[tokio::test]
async fn unknown_resource_is_an_error_reply() {
    let h = ready(false).await;
    let v = call(&h, methods::RESOURCES_READ, 12, Some(json!({"uri": "x://y"}))).await;
    assert_eq!(v["error"]["code"], error_codes::INVALID_PARAMS);
    assert_eq!(v["error"]["message"], "Unknown resource: x://y");
}

#[tokio::test]
async fn prompt_get_returns_user_message() {
    let h = ready(false).await;
    let v = call(
        &h,
        methods::PROMPTS_GET,
        13,
        Some(json!({"name": "greet", "arguments": {"who": "Ada"}})),
    )
    .await;
    assert_eq!(v["result"]["description"], "Greeting");
    assert_eq!(v["result"]["messages"][0]["role"], "user");
    assert_eq!(v["result"]["messages"][0]["content"]["text"], "Hello Ada");
}

#[tokio::test]
async fn sampling_round_trip_resumes_handler() {
    let h = ready(true).await;
    let step = h
        .dispatch(&rpc(methods::TOOLS_CALL, 14, Some(json!({"name": "ask"}))))
        .await;
    let Step::Sample(pending) = step else {
        panic!("expected a sampling request");
    };
    assert_eq!(pending.request_id(), &RequestId::Number(14));
    assert_eq!(pending.outbound().method, methods::SAMPLING_CREATE_MESSAGE);
    assert_eq!(
        pending.sampling_id(),
        &RequestId::String("conduit-sampling-1".into())
    );
    let params = pending.outbound().params.clone().expect("params");
    assert_eq!(params["messages"][0]["content"]["text"], "Buy?");

    let reply = json!({
        "role": "assistant",
        "content": {"type": "text", "text": "yes"},
        "model": "test"
    });
    let Step::Respond(out) = h.resume(pending, Ok(reply)).await else {
        panic!("expected a reply");
    };
    let v: Value = serde_json::from_str(&out.to_json().expect("ser")).expect("de");
    assert_eq!(v["id"], 14);
    assert_eq!(v["result"]["content"][0]["text"], "advice: yes");
}

#[tokio::test]
async fn sampling_error_reply_fails_the_call() {
    let h = ready(true).await;
    let Step::Sample(pending) = h
        .dispatch(&rpc(methods::TOOLS_CALL, 15, Some(json!({"name": "ask"}))))
        .await
    else {
        panic!("expected a sampling request");
    };
    let err = JsonRpcError {
        code: -1,
        message: "user declined".into(),
        data: None,
    };
    let Step::Respond(out) = h.resume(pending, Err(err)).await else {
        panic!("expected a reply");
    };
    let v: Value = serde_json::from_str(&out.to_json().expect("ser")).expect("de");
    assert_eq!(v["result"]["isError"], true);
    assert_eq!(
        v["result"]["content"][0]["text"],
        "Error in tool 'ask': sampling failed: user declined"
    );
}

#[tokio::test]
async fn expired_sampling_wait_fails_as_timeout() {
    let h = ready(true).await;
    let Step::Sample(pending) = h
        .dispatch(&rpc(methods::TOOLS_CALL, 17, Some(json!({"name": "ask"}))))
        .await
    else {
        panic!("expected a sampling request");
    };
    let Step::Respond(out) = h.expire(pending, Duration::from_secs(30)) else {
        panic!("expected a reply");
    };
    let v: Value = serde_json::from_str(&out.to_json().expect("ser")).expect("de");
    assert_eq!(v["id"], 17);
    assert_eq!(v["result"]["isError"], true);
    assert_eq!(
        v["result"]["content"][0]["text"],
        "Error in tool 'ask': timed out after 30s"
    );
}

#[tokio::test]
async fn sampling_without_capability_fails_immediately() {
    let h = ready(false).await;
    let v = call(&h, methods::TOOLS_CALL, 16, Some(json!({"name": "ask"}))).await;
    assert_eq!(
        v["result"]["content"][0]["text"],
        "Error in tool 'ask': client does not support sampling"
    );
}

#[test]
fn notifications_are_accepted_silently() {
    let h = handler();
    h.handle_notification(&JsonRpcNotification::new(
        methods::NOTIFICATIONS_INITIALIZED,
        None,
    ));
    h.handle_notification(&JsonRpcNotification::new("notifications/whatever", None));
}
