//! Integration tests for JSON-RPC 2.0 types.

use bridge_protocol::{
    error_codes, JsonRpcErrorResponse, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId,
};
use serde_json::json;

#[test]
fn request_serialization() {
    let req = JsonRpcRequest::new(RequestId::from(1_i64), "tools/list", None);
    let json = serde_json::to_string(&req).expect("ser");
    assert!(json.contains("\"jsonrpc\":\"2.0\""));
    assert!(json.contains("\"method\":\"tools/list\""));
    assert!(!json.contains("params"));
}

#[test]
fn response_roundtrip() {
    let resp = JsonRpcResponse::success(RequestId::String("abc".into()), json!({"tools": []}));
    let json = serde_json::to_string(&resp).expect("ser");
    let back: JsonRpcResponse = serde_json::from_str(&json).expect("de");
    assert_eq!(back.id, RequestId::String("abc".into()));
}

#[test]
fn error_response_structure() {
    let err = JsonRpcErrorResponse::error(
        RequestId::from(1_i64),
        error_codes::METHOD_NOT_FOUND,
        "method not found",
    );
    assert_eq!(err.error.code, -32601);
    assert_eq!(err.id, Some(RequestId::from(1_i64)));
    assert!(err.error.data.is_none());
}

#[test]
fn error_response_without_id_serializes_null() {
    let err = JsonRpcErrorResponse::with_optional_id(None, error_codes::PARSE_ERROR, "Parse error");
    let s = serde_json::to_string(&err).expect("ser");
    assert!(s.contains("\"id\":null"));
}

#[test]
fn notification_deserializes_without_id() {
    let s = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
    let n: JsonRpcNotification = serde_json::from_str(s).expect("de");
    assert_eq!(n.method, "notifications/initialized");
    assert!(n.params.is_none());
}

#[test]
fn request_id_number_vs_string() {
    assert_ne!(RequestId::from(1_i64), RequestId::String("1".into()));
    assert_eq!(RequestId::from(42_i64), RequestId::from(42_i64));
}

#[test]
fn message_accessors_cover_every_variant() {
    let req: JsonRpcMessage = JsonRpcRequest::new(RequestId::from(1_i64), "a", None).into();
    let note: JsonRpcMessage = JsonRpcNotification::new("b", None).into();
    let ok: JsonRpcMessage = JsonRpcResponse::success(RequestId::from(1_i64), json!(1)).into();
    let err: JsonRpcMessage =
        JsonRpcErrorResponse::error(RequestId::from(1_i64), error_codes::INTERNAL_ERROR, "x").into();

    assert_eq!(req.method(), Some("a"));
    assert_eq!(note.method(), Some("b"));
    assert!(ok.method().is_none());
    assert!(err.method().is_none());

    assert!(!req.is_response());
    assert!(!note.is_response());
    assert!(ok.is_response());
    assert!(err.is_response());
}
