//! JSON-RPC style message types for the MCP wire protocol.
//!
//! This module is the message codec: it defines the request/response shapes
//! exchanged over the line-delimited transport and the conversions between
//! wire text and typed values.
//!
//! # Message Types
//!
//! - **Request**: a method invocation, optionally carrying an `id`
//! - **Response**: a reply carrying exactly one of `result` or `error`
//!
//! # Wire Constraints
//!
//! - One JSON document per line, no embedded newlines
//! - Request IDs are strings or integers; a request without an `id` is
//!   answered with `"id": null`
//! - Incoming requests are not required to carry a `jsonrpc` field; every
//!   outgoing response carries `"jsonrpc": "2.0"`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The MCP protocol version this implementation supports.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name advertised during initialisation.
pub const SERVER_NAME: &str = "mathviz-mcp";

/// A request ID: a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A decoded request.
///
/// `id` is `None` both for an absent `id` field and for an explicit `null`;
/// either way the matching response carries `"id": null`.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    /// Request identifier, echoed verbatim on the response.
    #[serde(default)]
    pub id: Option<RequestId>,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// The set of recognised protocol methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Session initialisation and capability exchange.
    Initialize,
    /// Enumerate tool descriptors.
    ToolsList,
    /// Invoke a tool by name.
    ToolsCall,
    /// Enumerate resource descriptors.
    ResourcesList,
    /// Read a resource by URI.
    ResourcesRead,
}

impl Method {
    /// Maps a wire method name to its tag, or `None` if unrecognised.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            "resources/list" => Some(Self::ResourcesList),
            "resources/read" => Some(Self::ResourcesRead),
            _ => None,
        }
    }

    /// Returns the wire name of this method.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
            Self::ResourcesList => "resources/list",
            Self::ResourcesRead => "resources/read",
        }
    }
}

/// Protocol error codes.
///
/// The code space is fixed and caller-visible; no error ever carries code zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Input line is not a well-formed request document.
    ParseError,
    /// The method, tool, or resource does not exist.
    MethodNotFound,
    /// Missing required field, wrong shape, or malformed embedded arguments.
    InvalidParams,
    /// Any uncaught provider or engine fault.
    InternalError,
    /// An operational method was called before `initialize` succeeded.
    NotInitialized,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::NotInitialized => -32002,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::NotInitialized => "Server not initialized",
        }
    }
}

/// The error object carried by an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    /// The numeric error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional structured detail about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorData {
    /// Creates an error from a code with its default message.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
            data: None,
        }
    }

    /// Creates an error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Adds additional data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// An outgoing response: exactly one of `result` or `error`, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// A successful response.
    Success {
        /// Always "2.0".
        jsonrpc: String,
        /// The request ID this response corresponds to (`null` if unknown).
        id: Option<RequestId>,
        /// The result of the method call.
        result: Value,
    },
    /// An error response.
    Error {
        /// Always "2.0".
        jsonrpc: String,
        /// The request ID this response corresponds to (`null` if unknown).
        id: Option<RequestId>,
        /// The error details.
        error: ErrorData,
    },
}

impl Response {
    /// Creates a success response.
    #[must_use]
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self::Success {
            jsonrpc: "2.0".to_string(),
            id,
            result,
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(id: Option<RequestId>, error: ErrorData) -> Self {
        Self::Error {
            jsonrpc: "2.0".to_string(),
            id,
            error,
        }
    }

    /// Creates a parse error response (the ID cannot be determined).
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::error(None, ErrorData::with_message(ErrorCode::ParseError, message))
    }

    /// Creates a method not found error response.
    #[must_use]
    pub fn method_not_found(id: Option<RequestId>, method: &str) -> Self {
        Self::error(
            id,
            ErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::error(id, ErrorData::with_message(ErrorCode::InternalError, message))
    }

    /// Returns the request ID this response corresponds to.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Success { id, .. } | Self::Error { id, .. } => id.as_ref(),
        }
    }

    /// Returns the error details if this is an error response.
    #[must_use]
    pub const fn error_data(&self) -> Option<&ErrorData> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error, .. } => Some(error),
        }
    }
}

/// A request line failed to decode.
///
/// The request ID is unknown at this point, so the corresponding response
/// must carry a `null` identifier.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct DecodeError {
    #[from]
    source: serde_json::Error,
}

/// Decodes one line of input into a [`Request`].
///
/// The line must be a single well-formed JSON document conforming to the
/// request shape: a `method` string, an optional string/integer `id`, and
/// optional `params`.
///
/// # Errors
///
/// Returns a [`DecodeError`] carrying the parse failure description if the
/// line is malformed or does not match the request shape.
pub fn decode(line: &str) -> Result<Request, DecodeError> {
    Ok(serde_json::from_str(line)?)
}

/// Encodes a [`Response`] as a single line of JSON.
///
/// The output never contains embedded newlines; the transport appends the
/// terminating newline.
///
/// # Errors
///
/// Returns an error if serialisation fails.
pub fn encode(response: &Response) -> Result<String, serde_json::Error> {
    serde_json::to_string(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_valid_request() {
        let json = r#"{"id": 1, "method": "initialize", "params": {}}"#;
        let req = decode(json).unwrap();

        assert_eq!(req.id, Some(RequestId::Number(1)));
        assert_eq!(req.method, "initialize");
        assert!(req.params.is_some());
    }

    #[test]
    fn decode_accepts_jsonrpc_field() {
        let json = r#"{"jsonrpc": "2.0", "id": 7, "method": "tools/list"}"#;
        let req = decode(json).unwrap();
        assert_eq!(req.id, Some(RequestId::Number(7)));
        assert_eq!(req.method, "tools/list");
    }

    #[test]
    fn decode_string_id() {
        let json = r#"{"id": "abc-123", "method": "tools/call"}"#;
        let req = decode(json).unwrap();
        assert_eq!(req.id, Some(RequestId::String("abc-123".to_string())));
    }

    #[test]
    fn decode_absent_and_null_id() {
        let absent = decode(r#"{"method": "tools/list"}"#).unwrap();
        assert_eq!(absent.id, None);

        let null = decode(r#"{"id": null, "method": "tools/list"}"#).unwrap();
        assert_eq!(null.id, None);
    }

    #[test]
    fn decode_invalid_json() {
        assert!(decode("not valid json").is_err());
    }

    #[test]
    fn decode_non_object() {
        assert!(decode("5").is_err());
        assert!(decode(r#"["a", "b"]"#).is_err());
    }

    #[test]
    fn decode_missing_method() {
        assert!(decode(r#"{"id": 1, "params": {}}"#).is_err());
    }

    #[test]
    fn decode_structured_id_rejected() {
        assert!(decode(r#"{"id": {"nested": true}, "method": "x"}"#).is_err());
    }

    #[test]
    fn method_name_round_trip() {
        for method in [
            Method::Initialize,
            Method::ToolsList,
            Method::ToolsCall,
            Method::ResourcesList,
            Method::ResourcesRead,
        ] {
            assert_eq!(Method::from_name(method.name()), Some(method));
        }
        assert_eq!(Method::from_name("tools/unknown"), None);
    }

    #[test]
    fn error_codes() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::InternalError.code(), -32603);
        assert_eq!(ErrorCode::NotInitialized.code(), -32002);
    }

    #[test]
    fn encode_success_response() {
        let response = Response::success(
            Some(RequestId::Number(1)),
            serde_json::json!({"ok": true}),
        );
        let json = encode(&response).unwrap();
        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""id":1"#));
        assert!(json.contains(r#""result":{"ok":true}"#));
        assert!(!json.contains("error"));
    }

    #[test]
    fn encode_error_response() {
        let response = Response::method_not_found(Some(RequestId::Number(1)), "unknown/method");
        let json = encode(&response).unwrap();
        assert!(json.contains(r#""code":-32601"#));
        assert!(json.contains("unknown/method"));
        assert!(!json.contains("result"));
    }

    #[test]
    fn encode_null_id_when_unknown() {
        let response = Response::parse_error("Parse error: bad input");
        let json = encode(&response).unwrap();
        assert!(json.contains(r#""id":null"#));
        assert!(json.contains(r#""code":-32700"#));
    }

    #[test]
    fn response_round_trip() {
        let original = Response::success(
            Some(RequestId::String("req-1".to_string())),
            serde_json::json!({"tools": []}),
        );
        let json = encode(&original).unwrap();
        let decoded: Response = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.id(), Some(&RequestId::String("req-1".to_string())));
        assert!(decoded.error_data().is_none());

        let original = Response::error(
            None,
            ErrorData::with_message(ErrorCode::InvalidParams, "Missing tool name")
                .with_data(serde_json::json!({"field": "name"})),
        );
        let json = encode(&original).unwrap();
        let decoded: Response = serde_json::from_str(&json).unwrap();

        let error = decoded.error_data().expect("error response");
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Missing tool name");
        assert!(error.data.is_some());
    }

    #[test]
    fn request_id_display() {
        assert_eq!(format!("{}", RequestId::Number(42)), "42");
        assert_eq!(format!("{}", RequestId::String("abc".to_string())), "abc");
    }
}
