//! RPC Wire Protocol
//!
//! This module defines the wire message structures for the RPC protocol and the
//! validation rules that turn an untrusted payload into a well-formed [`Request`].
//! It leverages Serde for JSON serialization; every message is a single UTF-8
//! JSON object, one message per request or response.

use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };

/// Named parameters for an action call. Always a JSON object, possibly empty.
pub type Params = Map<String, Value>;

/// A validated RPC request.
///
/// `request_id` is an opaque, client-generated token used only to correlate the
/// eventual response; it may be absent. `action` names a registered handler and
/// is guaranteed non-empty after validation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Request {
    /// Client-generated correlation token
    pub request_id: Option<String>,
    /// Name of the handler to invoke
    pub action: String,
    /// Named parameters, passed to the handler as-is
    #[serde(default)]
    pub params: Params,
}

/// An RPC response, correlated to its request by `request_id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    /// ID echoed from the originating request, or `None` if it could not be
    /// determined (payload was not even a JSON object)
    pub request_id: Option<String>,
    /// Either a successful result or error details
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Represents either a successful result or an error.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// Success case carrying the handler's return value
    Ok {
        result: Value,
    },
    /// Error case with a machine-readable code and description
    Error {
        error: RpcError,
    },
}

/// Machine-readable error categories reported to clients.
///
/// The set is stable on purpose: handler-specific failures map into
/// `invalid_params` or `server_error` rather than growing ad hoc codes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Payload is not syntactically valid JSON
    InvalidJson,
    /// Payload is valid JSON but not an object
    InvalidPayload,
    /// `action` is missing, empty, or not a string
    InvalidAction,
    /// `params` is not an object, or does not satisfy the handler's contract
    InvalidParams,
    /// No handler is registered under the requested action name
    UnknownAction,
    /// The handler failed internally
    ServerError,
}

/// Error details carried inside an error response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    /// Short error category for programmatic handling
    pub code: ErrorCode,
    /// Human-readable description
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// A request that failed validation before it could be dispatched.
///
/// Carries the request ID whenever one could be extracted, so the resulting
/// error response still correlates to the right request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolViolation {
    pub request_id: Option<String>,
    pub error: RpcError,
}

impl Response {
    /// Build a success response for the given request ID.
    pub fn ok(request_id: Option<String>, result: Value) -> Self {
        Self { request_id, outcome: Outcome::Ok { result } }
    }

    /// Build an error response for the given request ID.
    pub fn error(request_id: Option<String>, error: RpcError) -> Self {
        Self { request_id, outcome: Outcome::Error { error } }
    }

    /// Whether this response reports success.
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Ok { .. })
    }
}

impl From<ProtocolViolation> for Response {
    fn from(violation: ProtocolViolation) -> Self {
        Response::error(violation.request_id, violation.error)
    }
}

/// Convert a raw payload into a validated [`Request`].
///
/// Validation order matters: the request ID is extracted *before* the remaining
/// fields are checked, so every error past the decode/shape stage can still be
/// correlated to the request that caused it. Only a payload that is not valid
/// JSON, or not a JSON object, produces an uncorrelated error.
pub fn parse_request(raw: &str) -> Result<Request, ProtocolViolation> {
    // If it's not valid JSON, we can't even determine the request_id
    let payload: Value = serde_json::from_str(raw).map_err(|_| ProtocolViolation {
        request_id: None,
        error: RpcError::new(ErrorCode::InvalidJson, "Payload is not valid JSON"),
    })?;

    // The message must be a JSON object, not a string or array
    let payload = payload.as_object().ok_or_else(|| ProtocolViolation {
        request_id: None,
        error: RpcError::new(ErrorCode::InvalidPayload, "Payload must be a JSON object"),
    })?;

    // Extract the request ID first so later errors stay correlated. A
    // non-string ID is treated as absent rather than rejected.
    let request_id = payload
        .get("request_id")
        .and_then(Value::as_str)
        .map(String::from);

    // Every request must name an action
    let action = match payload.get("action").and_then(Value::as_str) {
        Some(action) if !action.is_empty() => action.to_string(),
        _ => {
            return Err(ProtocolViolation {
                request_id,
                error: RpcError::new(ErrorCode::InvalidAction, "Missing or invalid 'action'"),
            });
        }
    };

    // Parameters default to an empty object only when absent; anything
    // present, including an explicit null, must be an object
    let params = match payload.get("params") {
        None => Params::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(ProtocolViolation {
                request_id,
                error: RpcError::new(ErrorCode::InvalidParams, "'params' must be an object"),
            });
        }
    };

    Ok(Request { request_id, action, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violation(raw: &str) -> ProtocolViolation {
        parse_request(raw).expect_err("expected validation to fail")
    }

    #[test]
    fn parse_request_round_trips_through_encode() {
        let request = Request {
            request_id: Some("r1".to_string()),
            action: "add_numbers".to_string(),
            params: json!({ "a": 10, "b": 20 }).as_object().unwrap().clone(),
        };

        let encoded = serde_json::to_string(&request).unwrap();
        let parsed = parse_request(&encoded).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn malformed_json_is_invalid_json_without_request_id() {
        let v = violation("{not json");
        assert_eq!(v.error.code, ErrorCode::InvalidJson);
        assert_eq!(v.request_id, None);
    }

    #[test]
    fn non_object_payload_is_invalid_payload() {
        for raw in ["[1, 2, 3]", "\"hello\"", "42", "null"] {
            let v = violation(raw);
            assert_eq!(v.error.code, ErrorCode::InvalidPayload);
            assert_eq!(v.request_id, None);
        }
    }

    #[test]
    fn missing_action_preserves_request_id() {
        let v = violation(r#"{"request_id": "r7", "params": {}}"#);
        assert_eq!(v.error.code, ErrorCode::InvalidAction);
        assert_eq!(v.request_id.as_deref(), Some("r7"));
    }

    #[test]
    fn non_string_or_empty_action_is_invalid_action() {
        for raw in [
            r#"{"action": 42}"#,
            r#"{"action": ""}"#,
            r#"{"action": null}"#,
            r#"{"action": ["echo"]}"#,
        ] {
            assert_eq!(violation(raw).error.code, ErrorCode::InvalidAction);
        }
    }

    #[test]
    fn non_object_params_is_invalid_params_with_request_id() {
        let v = violation(r#"{"request_id": "r8", "action": "echo", "params": [1]}"#);
        assert_eq!(v.error.code, ErrorCode::InvalidParams);
        assert_eq!(v.request_id.as_deref(), Some("r8"));
    }

    #[test]
    fn explicit_null_params_is_invalid_params_with_request_id() {
        let v = violation(r#"{"request_id": "rp", "action": "status", "params": null}"#);
        assert_eq!(v.error.code, ErrorCode::InvalidParams);
        assert_eq!(v.request_id.as_deref(), Some("rp"));
    }

    #[test]
    fn absent_params_defaults_to_empty_object() {
        let request = parse_request(r#"{"request_id": "r9", "action": "ping"}"#).unwrap();
        assert!(request.params.is_empty());
    }

    #[test]
    fn non_string_request_id_is_treated_as_absent() {
        let request = parse_request(r#"{"request_id": 7, "action": "ping"}"#).unwrap();
        assert_eq!(request.request_id, None);

        // The same rule holds on error paths: no made-up correlation token
        let v = violation(r#"{"request_id": 7, "params": {}}"#);
        assert_eq!(v.error.code, ErrorCode::InvalidAction);
        assert_eq!(v.request_id, None);
    }

    #[test]
    fn ok_response_wire_shape() {
        let response = Response::ok(Some("r1".to_string()), json!(30));
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded, json!({ "request_id": "r1", "status": "ok", "result": 30 }));
    }

    #[test]
    fn error_response_wire_shape() {
        let response = Response::error(
            None,
            RpcError::new(ErrorCode::UnknownAction, "Unknown action 'bogus'")
        );
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(
            encoded,
            json!({
                "request_id": null,
                "status": "error",
                "error": { "code": "unknown_action", "message": "Unknown action 'bogus'" }
            })
        );
    }

    #[test]
    fn response_decodes_from_wire_text() {
        let raw = r#"{"request_id": "r2", "status": "ok", "result": "hi"}"#;
        let response: Response = serde_json::from_str(raw).unwrap();
        assert!(response.is_ok());
        assert_eq!(response.request_id.as_deref(), Some("r2"));
    }
}
