//! MCP protocol engine and session lifecycle.
//!
//! The engine owns the session state machine and routes each decoded request
//! to the correct handler, wrapping provider results and failures into
//! protocol-conformant responses.
//!
//! # State machine
//!
//! Two states, tracked as a single boolean per engine instance:
//!
//! - `UNINITIALIZED` — only `initialize` succeeds; operational methods are
//!   answered with a "not initialized" error
//! - `READY` — all methods are served; `initialize` may be re-run
//!   (idempotent)
//!
//! Unrecognised methods are answered with "method not found" in either state.
//! There is no terminal state; process exit ends the session.
//!
//! # Failure semantics
//!
//! Every handler catches provider failures at its own boundary: a fault in
//! one request only produces an error response for that request, never a
//! corrupted session or an aborted loop. Each engine instance owns its own
//! session state; serving multiple connections means one engine per
//! connection.

use serde_json::{json, Map, Value};

use crate::mcp::protocol::{
    self, ErrorCode, ErrorData, Method, Request, Response, PROTOCOL_VERSION,
};
use crate::mcp::transport::StdioTransport;
use crate::service::{McpService, ServiceError};

/// Client information received during initialisation, used for logging only.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    /// Protocol version requested by the client.
    #[serde(default)]
    protocol_version: Option<String>,
    /// Client identity.
    #[serde(default)]
    client_info: Option<ClientInfo>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct ClientInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// The MCP server: protocol engine plus transport loop.
pub struct McpServer<S: McpService> {
    /// Session state: flipped to `true` by a successful initialize.
    initialized: bool,
    /// The tool/resource provider.
    service: S,
    /// The transport layer.
    transport: StdioTransport,
}

impl<S: McpService> McpServer<S> {
    /// Creates a new server around the given provider.
    #[must_use]
    pub fn new(service: S) -> Self {
        Self {
            initialized: false,
            service,
            transport: StdioTransport::new(),
        }
    }

    /// Returns whether the session has been initialised.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Runs the server main loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown signals.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, shutting down");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown signals.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result of one transport read.
    ///
    /// Returns `true` when the server should shut down (end of input).
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::info!("End of input, shutting down");
            return Ok(true);
        };

        // Whitespace-only lines are skipped without a response
        if line.trim().is_empty() {
            return Ok(false);
        }

        self.handle_line(&line).await?;
        Ok(false)
    }

    /// Decodes one line, dispatches it, and writes exactly one response.
    async fn handle_line(&mut self, line: &str) -> std::io::Result<()> {
        let response = match protocol::decode(line) {
            Ok(request) => self.handle_request(request),
            Err(e) => Response::parse_error(format!("Parse error: {e}")),
        };

        self.write_response(&response).await
    }

    /// Encodes and writes a response.
    ///
    /// An encoding failure is itself converted into an internal error
    /// response with a null id; the loop continues.
    async fn write_response(&mut self, response: &Response) -> std::io::Result<()> {
        let json = match protocol::encode(response) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialise response");
                let fallback = Response::internal_error(None, format!("Internal error: {e}"));
                protocol::encode(&fallback)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?
            }
        };

        self.transport.write_line(&json).await
    }

    /// Routes a decoded request and produces its response.
    ///
    /// This is the pure engine entry point: no I/O, one response per request,
    /// the request id echoed verbatim (null when absent).
    pub fn handle_request(&mut self, request: Request) -> Response {
        let Request { id, method, params } = request;

        let outcome = match Method::from_name(&method) {
            Some(tag) => {
                tracing::debug!(method = tag.name(), id = ?id, "Handling request");
                self.dispatch(tag, params)
            }
            None => Err(ErrorData::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            )),
        };

        match outcome {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::error(id, error),
        }
    }

    /// Dispatches a recognised method according to the session state machine.
    fn dispatch(&mut self, method: Method, params: Option<Value>) -> Result<Value, ErrorData> {
        match method {
            Method::Initialize => Ok(self.handle_initialize(params)),
            _ if !self.initialized => Err(ErrorData::from_code(ErrorCode::NotInitialized)),
            Method::ToolsList => Ok(self.handle_tools_list()),
            Method::ToolsCall => self.handle_tools_call(params),
            Method::ResourcesList => Ok(self.handle_resources_list()),
            Method::ResourcesRead => self.handle_resources_read(params),
        }
    }

    /// Handles initialize: records the session as ready and reports server
    /// identity. Re-initialising an already-ready session is allowed.
    fn handle_initialize(&mut self, params: Option<Value>) -> Value {
        if let Some(params) = params {
            if let Ok(init) = serde_json::from_value::<InitializeParams>(params) {
                let client = init.client_info.as_ref();
                tracing::info!(
                    client_name = client.and_then(|c| c.name.as_deref()),
                    client_version = client.and_then(|c| c.version.as_deref()),
                    requested_version = init.protocol_version.as_deref(),
                    "Client initialising"
                );
            }
        }

        self.initialized = true;

        let description = self.service.describe();
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": description.capabilities,
            "serverInfo": {
                "name": description.name,
                "version": description.version,
                "description": description.description,
            },
        })
    }

    /// Handles tools/list.
    fn handle_tools_list(&self) -> Value {
        json!({ "tools": self.service.list_tools() })
    }

    /// Handles tools/call: validates the envelope, invokes the provider, and
    /// wraps the outcome.
    fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, ErrorData> {
        let params = params.unwrap_or_else(|| json!({}));

        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Err(ErrorData::with_message(
                ErrorCode::InvalidParams,
                "Missing tool name",
            ));
        };

        // `arguments` defaults to an empty structure; when supplied as raw
        // text it is decoded here, before the provider is ever invoked
        let arguments: Map<String, Value> = match params.get("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(Value::String(raw)) => serde_json::from_str(raw).map_err(|_| {
                ErrorData::with_message(ErrorCode::InvalidParams, "Invalid arguments format")
            })?,
            Some(_) => {
                return Err(ErrorData::with_message(
                    ErrorCode::InvalidParams,
                    "Invalid arguments format",
                ));
            }
        };

        tracing::debug!(tool = name, "Calling tool");

        match self.service.call_tool(name, &arguments) {
            Ok(value) => {
                let text = render_content(value)?;
                Ok(json!({ "content": [{ "type": "text", "text": text }] }))
            }
            Err(e) => Err(declared_error(&e)),
        }
    }

    /// Handles resources/list.
    fn handle_resources_list(&self) -> Value {
        json!({ "resources": self.service.list_resources() })
    }

    /// Handles resources/read: the provider's return value becomes the
    /// response result directly, since resource payloads carry their own
    /// shape.
    fn handle_resources_read(&self, params: Option<Value>) -> Result<Value, ErrorData> {
        let params = params.unwrap_or_else(|| json!({}));

        let Some(uri) = params.get("uri").and_then(Value::as_str) else {
            return Err(ErrorData::with_message(
                ErrorCode::InvalidParams,
                "Missing resource URI",
            ));
        };

        tracing::debug!(uri, "Reading resource");

        self.service
            .read_resource(uri)
            .map_err(|e| declared_error(&e))
    }
}

/// Converts a declared provider error into wire error data, preserving its
/// code and message.
fn declared_error(error: &ServiceError) -> ErrorData {
    ErrorData::with_message(error.code(), error.to_string())
}

/// Renders a tool's return value as the text body of a content envelope.
///
/// Composite values serialise to canonical indented JSON; plain text passes
/// through unchanged; anything else is stringified.
fn render_content(value: Value) -> Result<String, ErrorData> {
    match value {
        Value::String(text) => Ok(text),
        composite @ (Value::Object(_) | Value::Array(_)) => serde_json::to_string_pretty(&composite)
            .map_err(|e| {
                ErrorData::with_message(
                    ErrorCode::InternalError,
                    format!("Internal error: failed to serialise result: {e}"),
                )
            }),
        scalar => Ok(scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::RequestId;
    use crate::service::{Arguments, ResourceDescriptor, ServerDescription, ToolDescriptor};

    /// A minimal provider for exercising the engine in isolation.
    struct StubService;

    impl McpService for StubService {
        fn describe(&self) -> ServerDescription {
            ServerDescription {
                name: "stub".to_string(),
                version: "0.0.0".to_string(),
                description: "stub service".to_string(),
                capabilities: json!({"tools": {"listChanged": false}}),
            }
        }

        fn list_tools(&self) -> Vec<ToolDescriptor> {
            vec![ToolDescriptor {
                name: "echo".to_string(),
                description: "echoes".to_string(),
                input_schema: json!({"type": "object"}),
            }]
        }

        fn call_tool(&self, name: &str, arguments: &Arguments) -> Result<Value, ServiceError> {
            match name {
                "echo" => Ok(Value::Object(arguments.clone())),
                "text" => Ok(json!("plain text")),
                "scalar" => Ok(json!(8)),
                "fail" => Err(ServiceError::Execution("backend exploded".to_string())),
                other => Err(ServiceError::UnknownTool(other.to_string())),
            }
        }

        fn list_resources(&self) -> Vec<ResourceDescriptor> {
            vec![ResourceDescriptor {
                uri: "stub://doc".to_string(),
                name: "Doc".to_string(),
                description: "a doc".to_string(),
                mime_type: "text/plain".to_string(),
            }]
        }

        fn read_resource(&self, uri: &str) -> Result<Value, ServiceError> {
            if uri == "stub://doc" {
                Ok(json!({"contents": [{"type": "text", "text": "hello"}]}))
            } else {
                Err(ServiceError::UnknownResource(uri.to_string()))
            }
        }
    }

    fn request(json: &str) -> Request {
        protocol::decode(json).unwrap()
    }

    fn server() -> McpServer<StubService> {
        McpServer::new(StubService)
    }

    fn initialized_server() -> McpServer<StubService> {
        let mut server = server();
        let response =
            server.handle_request(request(r#"{"id": 0, "method": "initialize", "params": {}}"#));
        assert!(response.error_data().is_none());
        server
    }

    #[test]
    fn operational_methods_require_initialize() {
        let mut server = server();

        for method in ["tools/list", "tools/call", "resources/list", "resources/read"] {
            let response = server
                .handle_request(request(&format!(r#"{{"id": 1, "method": "{method}"}}"#)));
            let error = response.error_data().expect("expected error before init");
            assert_eq!(error.code, -32002, "method {method}");
        }
        assert!(!server.is_initialized());
    }

    #[test]
    fn initialize_transitions_to_ready() {
        let mut server = server();
        let response =
            server.handle_request(request(r#"{"id": 1, "method": "initialize", "params": {}}"#));

        assert!(server.is_initialized());
        let Response::Success { result, .. } = response else {
            panic!("expected success");
        };
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result.get("capabilities").is_some());
        assert_eq!(result["serverInfo"]["name"], "stub");
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut server = initialized_server();
        let response =
            server.handle_request(request(r#"{"id": 2, "method": "initialize", "params": {}}"#));
        assert!(response.error_data().is_none());
        assert!(server.is_initialized());
    }

    #[test]
    fn unknown_method_is_not_found_in_any_state() {
        let mut server = server();
        let response = server.handle_request(request(r#"{"id": 1, "method": "tools/unknown"}"#));
        assert_eq!(response.error_data().unwrap().code, -32601);

        let mut server = initialized_server();
        let response = server.handle_request(request(r#"{"id": 2, "method": "tools/unknown"}"#));
        assert_eq!(response.error_data().unwrap().code, -32601);
    }

    #[test]
    fn response_echoes_id_exactly() {
        let mut server = initialized_server();

        let response =
            server.handle_request(request(r#"{"id": 42, "method": "tools/list"}"#));
        assert_eq!(response.id(), Some(&RequestId::Number(42)));

        let response =
            server.handle_request(request(r#"{"id": "req-9", "method": "tools/list"}"#));
        assert_eq!(response.id(), Some(&RequestId::String("req-9".to_string())));

        let response = server.handle_request(request(r#"{"method": "tools/list"}"#));
        assert_eq!(response.id(), None);
    }

    #[test]
    fn tools_call_missing_name() {
        let mut server = initialized_server();
        let response = server
            .handle_request(request(r#"{"id": 1, "method": "tools/call", "params": {}}"#));
        let error = response.error_data().unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("Missing tool name"));
    }

    #[test]
    fn tools_call_unknown_tool() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "tools/call", "params": {"name": "nope"}}"#,
        ));
        let error = response.error_data().unwrap();
        assert_eq!(error.code, -32601);
        assert!(error.message.contains("Unknown tool: nope"));
    }

    #[test]
    fn tools_call_arguments_default_to_empty() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "tools/call", "params": {"name": "echo"}}"#,
        ));
        let Response::Success { result, .. } = response else {
            panic!("expected success");
        };
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "{}");
    }

    #[test]
    fn tools_call_arguments_as_valid_string() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "tools/call", "params": {"name": "echo", "arguments": "{\"a\": 1}"}}"#,
        ));
        let Response::Success { result, .. } = response else {
            panic!("expected success");
        };
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"a\": 1"));
    }

    #[test]
    fn tools_call_arguments_as_malformed_string() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "tools/call", "params": {"name": "echo", "arguments": "{not json"}}"#,
        ));
        let error = response.error_data().unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("Invalid arguments format"));
    }

    #[test]
    fn tools_call_arguments_wrong_type() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "tools/call", "params": {"name": "echo", "arguments": 5}}"#,
        ));
        assert_eq!(response.error_data().unwrap().code, -32602);
    }

    #[test]
    fn tools_call_wraps_composite_as_indented_json() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "tools/call", "params": {"name": "echo", "arguments": {"x": [1, 2]}}}"#,
        ));
        let Response::Success { result, .. } = response else {
            panic!("expected success");
        };
        let text = result["content"][0]["text"].as_str().unwrap();
        // Canonical indented form, reparseable
        assert!(text.contains('\n'));
        let reparsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(reparsed["x"][0], 1);
    }

    #[test]
    fn tools_call_passes_plain_text_through() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "tools/call", "params": {"name": "text"}}"#,
        ));
        let Response::Success { result, .. } = response else {
            panic!("expected success");
        };
        assert_eq!(result["content"][0]["text"], "plain text");
    }

    #[test]
    fn tools_call_stringifies_scalars() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "tools/call", "params": {"name": "scalar"}}"#,
        ));
        let Response::Success { result, .. } = response else {
            panic!("expected success");
        };
        assert_eq!(result["content"][0]["text"], "8");
    }

    #[test]
    fn tools_call_wraps_provider_failure_as_internal_error() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "tools/call", "params": {"name": "fail"}}"#,
        ));
        let error = response.error_data().unwrap();
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("backend exploded"));
        // A provider fault never corrupts session state
        assert!(server.is_initialized());
    }

    #[test]
    fn resources_read_passes_payload_through() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "resources/read", "params": {"uri": "stub://doc"}}"#,
        ));
        let Response::Success { result, .. } = response else {
            panic!("expected success");
        };
        // No content-envelope wrapping: the provider payload is the result
        assert_eq!(result["contents"][0]["text"], "hello");
    }

    #[test]
    fn resources_read_missing_uri() {
        let mut server = initialized_server();
        let response = server
            .handle_request(request(r#"{"id": 1, "method": "resources/read", "params": {}}"#));
        let error = response.error_data().unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("Missing resource URI"));
    }

    #[tokio::test]
    async fn blank_lines_are_skipped_without_response() {
        let mut server = initialized_server();

        // Whitespace-only input produces no response and keeps the loop alive
        let shutdown = server
            .handle_transport_result(Ok(Some("   \t ".to_string())))
            .await
            .unwrap();
        assert!(!shutdown);

        let shutdown = server
            .handle_transport_result(Ok(Some(String::new())))
            .await
            .unwrap();
        assert!(!shutdown);
    }

    #[tokio::test]
    async fn end_of_input_shuts_down_cleanly() {
        let mut server = initialized_server();
        let shutdown = server.handle_transport_result(Ok(None)).await.unwrap();
        assert!(shutdown);
    }

    #[test]
    fn resources_read_unknown_uri() {
        let mut server = initialized_server();
        let response = server.handle_request(request(
            r#"{"id": 1, "method": "resources/read", "params": {"uri": "stub://missing"}}"#,
        ));
        let error = response.error_data().unwrap();
        assert_eq!(error.code, -32601);
        assert!(error.message.contains("Resource not found"));
    }
}
