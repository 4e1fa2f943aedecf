//! Earnings, forex and order servers against a local HTTP stub.

mod common;

use serde_json::{json, Value};

use common::{call, http_stub, ready, ready_with, tool_text};
use conduit_config::ConduitConfig;
use conduit_mcp::Step;
use conduit_protocol::{JsonRpcRequest, RequestId};
use conduit_servers::{build, ServerKind};

fn config_for(base_url: &str) -> ConduitConfig {
    let mut config = ConduitConfig::default();
    config.alpha_vantage.base_url = base_url.to_string();
    config.alpha_vantage.api_key = "test-key".into();
    config.alpaca.base_url = base_url.to_string();
    config.alpaca.key_id = "PKTEST".into();
    config.alpaca.secret_key = "shh".into();
    config
}

#[tokio::test]
async fn earnings_resource_queries_uppercased_symbol() {
    let (base, stub) = http_stub(200, r#"{"symbol":"IBM","annualEarnings":[]}"#).await;
    let h = ready(build(ServerKind::Earnings, &config_for(&base)).expect("build"), json!({})).await;

    let v = call(&h, "resources/read", json!({"uri": "stock://ibm/earnings"})).await;
    let c = &v["result"]["contents"][0];
    assert_eq!(c["uri"], "stock://ibm/earnings");
    assert_eq!(c["mimeType"], "application/json");
    assert_eq!(c["text"], r#"{"symbol":"IBM","annualEarnings":[]}"#);

    let request = stub.await.expect("stub");
    let line = request.lines().next().unwrap_or_default();
    assert!(line.starts_with("GET /query?"), "{line}");
    assert!(line.contains("function=EARNINGS"));
    assert!(line.contains("symbol=IBM"));
    assert!(line.contains("apikey=test-key"));
}

#[tokio::test]
async fn forex_resource_splits_pair() {
    let (base, stub) = http_stub(200, r#"{"Realtime Currency Exchange Rate":{"5. Exchange Rate":"151.2"}}"#).await;
    let h = ready(build(ServerKind::Forex, &config_for(&base)).expect("build"), json!({})).await;

    let v = call(&h, "resources/read", json!({"uri": "forex://USDJPY"})).await;
    let text = v["result"]["contents"][0]["text"].as_str().expect("text");
    let body: Value = serde_json::from_str(text).expect("json");
    assert_eq!(body["Realtime Currency Exchange Rate"]["5. Exchange Rate"], "151.2");

    let request = stub.await.expect("stub");
    let line = request.lines().next().unwrap_or_default();
    assert!(line.contains("function=CURRENCY_EXCHANGE_RATE"));
    assert!(line.contains("from_currency=USD"));
    assert!(line.contains("to_currency=JPY"));
}

#[tokio::test]
async fn forex_bad_pair_is_an_internal_error() {
    let h = ready(build(ServerKind::Forex, &ConduitConfig::default()).expect("build"), json!({})).await;
    let v = call(&h, "resources/read", json!({"uri": "forex://USD"})).await;
    assert_eq!(v["error"]["code"], -32603);
    assert_eq!(
        v["error"]["message"],
        "Error in resource 'get_forex_price': invalid currency pair 'USD': expected six letters like USDJPY"
    );
}

#[tokio::test]
async fn upstream_failure_is_isolated() {
    let (base, _stub) = http_stub(500, "{}").await;
    let h = ready(build(ServerKind::Earnings, &config_for(&base)).expect("build"), json!({})).await;
    let v = call(&h, "resources/read", json!({"uri": "stock://ibm/earnings"})).await;
    assert_eq!(v["error"]["code"], -32603);
    let message = v["error"]["message"].as_str().expect("message");
    assert!(message.starts_with("Error in resource 'Stock Earnings': request to "), "{message}");
    assert!(message.ends_with("HTTP 500 Internal Server Error"), "{message}");
}

#[tokio::test]
async fn simulated_forex_order() {
    let h = ready(build(ServerKind::Forex, &ConduitConfig::default()).expect("build"), json!({})).await;
    let v = call(
        &h,
        "tools/call",
        json!({"name": "place_order", "arguments": {"pair": "eurusd", "side": "buy", "quantity": 1000}}),
    )
    .await;
    let order: Value = serde_json::from_str(tool_text(&v)).expect("json");
    assert_eq!(order["symbol"], "EURUSD");
    assert_eq!(order["side"], "BUY");
    assert_eq!(order["type"], "MARKET");
    assert_eq!(order["price"], "market");
}

#[tokio::test]
async fn allowed_pairs_depend_on_roots() {
    let config = ConduitConfig::default();

    let h = ready(build(ServerKind::Forex, &config).expect("build"), json!({})).await;
    let v = call(&h, "tools/call", json!({"name": "list_allowed_pairs"})).await;
    let pairs: Vec<String> = serde_json::from_str(tool_text(&v)).expect("json");
    assert_eq!(pairs, vec!["ROOT NOT SET"]);

    let v = call(
        &h,
        "tools/call",
        json!({"name": "list_allowed_pairs", "arguments": {"root": "file:///desk"}}),
    )
    .await;
    let pairs: Vec<String> = serde_json::from_str(tool_text(&v)).expect("json");
    assert_eq!(pairs, vec!["USDJPY", "EURUSD", "GBPUSD"]);

    let h = ready_with(
        build(ServerKind::Forex, &config).expect("build"),
        json!({"roots": [{"uri": "file:///desk", "name": "desk"}]}),
    )
    .await;
    let v = call(&h, "tools/call", json!({"name": "list_allowed_pairs"})).await;
    let pairs: Vec<String> = serde_json::from_str(tool_text(&v)).expect("json");
    assert_eq!(pairs.len(), 3);
}

#[tokio::test]
async fn should_buy_asks_the_client() {
    let h = ready(
        build(ServerKind::Forex, &ConduitConfig::default()).expect("build"),
        json!({"sampling": {}}),
    )
    .await;
    let step = h
        .dispatch(&JsonRpcRequest::new(
            RequestId::Number(7),
            "tools/call",
            Some(json!({"name": "should_buy", "arguments": {"pair": "GBPUSD"}})),
        ))
        .await;
    let Step::Sample(pending) = step else {
        panic!("expected sampling");
    };
    let params = pending.outbound().params.clone().expect("params");
    let prompt = params["messages"][0]["content"]["text"].as_str().expect("prompt");
    assert!(prompt.starts_with("You are a financial analyst. Should we buy the currency pair GBPUSD?"));

    let reply = json!({"role": "assistant", "content": {"type": "text", "text": "No."}, "model": "m"});
    let Step::Respond(out) = h.resume(pending, Ok(reply)).await else {
        panic!("expected reply");
    };
    let v: Value = serde_json::from_str(&out.to_json().expect("ser")).expect("de");
    assert_eq!(v["id"], 7);
    assert_eq!(tool_text(&v), "No.");
}

#[tokio::test]
async fn stock_order_posts_normalised_payload() {
    let (base, stub) = http_stub(200, r#"{"id":"order-1","status":"accepted"}"#).await;
    let h = ready(build(ServerKind::Orders, &config_for(&base)).expect("build"), json!({})).await;

    let v = call(
        &h,
        "tools/call",
        json!({"name": "place_stock_order", "arguments": {
            "symbol": "aapl", "qty": 5, "side": "BUY",
            "order_type": "MARKET", "time_in_force": "day"
        }}),
    )
    .await;
    assert_eq!(v["result"]["isError"], false);
    assert_eq!(tool_text(&v), "Order placed: BUY 5 AAPL @ MARKET");

    let request = stub.await.expect("stub");
    assert!(request.starts_with("POST /orders "));
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("apca-api-key-id: pktest"));
    assert!(lower.contains("apca-api-secret-key: shh"));
    let body: Value = serde_json::from_str(request.split("\r\n\r\n").nth(1).expect("body")).expect("json");
    assert_eq!(
        body,
        json!({"symbol": "AAPL", "qty": 5, "side": "buy", "type": "market", "time_in_force": "day"})
    );
}

#[tokio::test]
async fn stock_order_with_unknown_side_fails_validation() {
    let h = ready(build(ServerKind::Orders, &ConduitConfig::default()).expect("build"), json!({})).await;
    let v = call(
        &h,
        "tools/call",
        json!({"name": "place_stock_order", "arguments": {
            "symbol": "aapl", "qty": 5, "side": "hold",
            "order_type": "market", "time_in_force": "day"
        }}),
    )
    .await;
    assert_eq!(v["result"]["isError"], true);
    assert!(tool_text(&v).starts_with("Invalid arguments for tool 'place_stock_order':"));
}

#[tokio::test]
async fn rejected_order_names_the_symbol() {
    let (base, _stub) = http_stub(403, r#"{"message":"forbidden"}"#).await;
    let h = ready(build(ServerKind::Orders, &config_for(&base)).expect("build"), json!({})).await;
    let v = call(
        &h,
        "tools/call",
        json!({"name": "place_stock_order", "arguments": {
            "symbol": "tsla", "qty": 1, "side": "sell",
            "order_type": "limit", "time_in_force": "gtc", "limit_price": 250.0
        }}),
    )
    .await;
    assert_eq!(v["result"]["isError"], true);
    assert!(tool_text(&v).starts_with("Error in tool 'place_stock_order': Failed to place order for TSLA: "));
}

#[tokio::test]
async fn git_commit_prompt() {
    let h = ready(build(ServerKind::GitPrompts, &ConduitConfig::default()).expect("build"), json!({})).await;
    let v = call(
        &h,
        "prompts/get",
        json!({"name": "git-commit", "arguments": {"changes": "fix typo in README"}}),
    )
    .await;
    assert_eq!(
        v["result"]["description"],
        "Generate a Git commit message from a code diff or change summary"
    );
    assert_eq!(
        v["result"]["messages"][0]["content"]["text"],
        "Generate a Git commit message summarizing these changes:\n\nfix typo in README"
    );
}
