//! The contract between the protocol engine and tool/resource providers.
//!
//! The engine has zero knowledge of provider internals: it consumes the
//! [`McpService`] trait and wraps whatever comes back into protocol-conformant
//! responses. Providers report failures as [`ServiceError`] values carrying a
//! protocol error code; the engine passes those through unchanged.

mod chart_tools;
mod gateway;
mod math_tools;
mod resources;

pub use gateway::GatewayService;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::mcp::protocol::ErrorCode;

/// The raw key-value argument structure handed to a tool call.
pub type Arguments = serde_json::Map<String, Value>;

/// Server identity and capabilities returned by [`McpService::describe`].
#[derive(Debug, Clone)]
pub struct ServerDescription {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// One-line description of what the server offers.
    pub description: String,
    /// Capability structure advertised during initialisation.
    pub capabilities: Value,
}

/// A tool definition for the tools/list response.
///
/// Computed once at startup from the set of registered tools; immutable
/// thereafter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// A resource definition for the resources/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// Unique URI, used as the lookup key for resources/read.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Content MIME type.
    pub mime_type: String,
}

/// A declared protocol-level provider error.
///
/// Each variant maps onto a fixed protocol error code; the engine propagates
/// code and message unchanged.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested tool is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The requested resource URI is not known.
    #[error("Resource not found: {0}")]
    UnknownResource(String),

    /// A required argument is absent.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The arguments do not match the tool's schema.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The tool ran but failed in a way it could not express as a result.
    #[error("Tool execution error: {0}")]
    Execution(String),
}

impl ServiceError {
    /// The protocol error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownTool(_) | Self::UnknownResource(_) => ErrorCode::MethodNotFound,
            Self::MissingParameter(_) | Self::InvalidParameters(_) => ErrorCode::InvalidParams,
            Self::Execution(_) => ErrorCode::InternalError,
        }
    }
}

/// The interface a tool/resource provider implements.
///
/// Providers are synchronous compute: each call runs to completion without
/// yielding. The engine invokes at most one provider call at a time per
/// session.
pub trait McpService {
    /// Returns server identity and capabilities for the initialize response.
    fn describe(&self) -> ServerDescription;

    /// Returns all tool descriptors, in stable registration order.
    fn list_tools(&self) -> Vec<ToolDescriptor>;

    /// Executes a tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownTool`] for an unregistered name, or the
    /// tool's own declared error.
    fn call_tool(&self, name: &str, arguments: &Arguments) -> Result<Value, ServiceError>;

    /// Returns all resource descriptors.
    fn list_resources(&self) -> Vec<ResourceDescriptor>;

    /// Reads a resource by URI (exact match).
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnknownResource`] when the URI is unrecognised.
    fn read_resource(&self, uri: &str) -> Result<Value, ServiceError>;
}

/// Deserialises a raw argument map into a typed argument struct.
///
/// Validation happens once at this boundary; handlers receive strongly-typed
/// values.
pub(crate) fn parse_args<T: DeserializeOwned>(arguments: &Arguments) -> Result<T, ServiceError> {
    serde_json::from_value(Value::Object(arguments.clone()))
        .map_err(|e| ServiceError::InvalidParameters(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn service_error_codes() {
        assert_eq!(
            ServiceError::UnknownTool("x".to_string()).code(),
            ErrorCode::MethodNotFound
        );
        assert_eq!(
            ServiceError::UnknownResource("x".to_string()).code(),
            ErrorCode::MethodNotFound
        );
        assert_eq!(
            ServiceError::MissingParameter("a").code(),
            ErrorCode::InvalidParams
        );
        assert_eq!(
            ServiceError::InvalidParameters("bad".to_string()).code(),
            ErrorCode::InvalidParams
        );
        assert_eq!(
            ServiceError::Execution("boom".to_string()).code(),
            ErrorCode::InternalError
        );
    }

    #[test]
    fn parse_args_typed() {
        #[derive(Deserialize)]
        struct Args {
            a: f64,
            b: f64,
        }

        let mut map = Arguments::new();
        map.insert("a".to_string(), serde_json::json!(5));
        map.insert("b".to_string(), serde_json::json!(3));

        let args: Args = parse_args(&map).unwrap();
        assert!((args.a - 5.0).abs() < f64::EPSILON);
        assert!((args.b - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_args_missing_field() {
        #[derive(Debug, Deserialize)]
        struct Args {
            #[allow(dead_code)]
            a: f64,
        }

        let map = Arguments::new();
        let err = parse_args::<Args>(&map).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParams);
        assert!(err.to_string().contains('a'));
    }

    #[test]
    fn descriptor_serialisation_uses_camel_case() {
        let tool = ToolDescriptor {
            name: "basic_arithmetic".to_string(),
            description: "test".to_string(),
            input_schema: serde_json::json!({"type": "object"}),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("inputSchema"));

        let resource = ResourceDescriptor {
            uri: "math://concepts/elementary".to_string(),
            name: "Elementary Math Concepts".to_string(),
            description: "test".to_string(),
            mime_type: "text/plain".to_string(),
        };
        let json = serde_json::to_string(&resource).unwrap();
        assert!(json.contains("mimeType"));
    }
}
