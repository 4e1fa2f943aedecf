//! Property-based tests for JSON-RPC parsing and schema validation.
//!
//! Ensures the parsers never panic on arbitrary input and that valid
//! messages are classified correctly.

use conduit_protocol::jsonrpc::{JsonRpcMessage, JsonRpcRequest};
use conduit_protocol::schema::{validate, ValidationMode};
use proptest::prelude::*;

proptest! {
    /// Arbitrary strings never cause a panic.
    #[test]
    fn no_panic_on_arbitrary_input(input in "\\PC{0,256}") {
        let _ = serde_json::from_str::<JsonRpcRequest>(&input);
        let _ = JsonRpcMessage::parse(&input);
    }

    /// Well-formed requests are classified as requests.
    #[test]
    fn valid_request_classified(method in "[a-z/]{1,32}", id in any::<i64>()) {
        let json = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
        });
        let parsed = JsonRpcMessage::parse(&json.to_string());
        prop_assert!(matches!(parsed, Ok(JsonRpcMessage::Request(_))));
    }

    /// Messages without an id but with a method are notifications.
    #[test]
    fn id_less_message_is_notification(method in "[a-z/]{2,16}") {
        let line = format!(r#"{{"jsonrpc":"2.0","method":"{method}"}}"#);
        let parsed = JsonRpcMessage::parse(&line);
        prop_assert!(matches!(parsed, Ok(JsonRpcMessage::Notification(_))));
    }

    /// Missing "jsonrpc" field is never accepted as a request.
    #[test]
    fn missing_jsonrpc_field_fails(method in "[a-z]{2,16}", id in 1i64..1000) {
        let json = format!(r#"{{"id":{id},"method":"{method}"}}"#);
        prop_assert!(serde_json::from_str::<JsonRpcRequest>(&json).is_err());
    }

    /// Schema validation never panics on arbitrary JSON input.
    #[test]
    fn validate_never_panics(key in "[a-z]{1,8}", n in any::<i64>(), s in "\\PC{0,16}") {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "slug": {"type": "string"}, "qty": {"type": "integer"} },
            "required": ["slug"]
        });
        let mut obj = serde_json::Map::new();
        obj.insert(key.clone(), serde_json::Value::from(n));
        obj.insert("slug".to_string(), serde_json::Value::from(s));
        let input = serde_json::Value::Object(obj);
        let _ = validate(&schema, &input, ValidationMode::Strict);
        let _ = validate(&schema, &serde_json::json!([key]), ValidationMode::Presence);
    }
}
