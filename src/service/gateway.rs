//! The unified gateway provider: every math and visualisation tool behind a
//! single registry, plus the static reference resources.
//!
//! The registry is built once at startup and never changes: an
//! insertion-ordered map from tool name to descriptor and handler, so
//! tools/list order is registration order and repeated listings are
//! identical.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::{json, Value};

use super::{chart_tools, math_tools, resources};
use super::{Arguments, McpService, ResourceDescriptor, ServerDescription, ServiceError, ToolDescriptor};
use crate::charts::{ChartError, ChartRenderer};
use crate::config::ChartsConfig;
use crate::mcp::protocol::SERVER_NAME;
use crate::solver::MathSolver;

/// A tool handler: receives the owning service and the raw argument map.
pub(super) type ToolHandler = fn(&GatewayService, &Arguments) -> Result<Value, ServiceError>;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: ToolHandler,
}

/// The math + visualisation gateway service.
pub struct GatewayService {
    pub(super) solver: MathSolver,
    pub(super) charts: ChartRenderer,
    tools: IndexMap<String, RegisteredTool>,
}

impl GatewayService {
    /// Creates the service from chart configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ChartError`] if the chart output directory cannot be
    /// created.
    pub fn new(charts: &ChartsConfig) -> Result<Self, ChartError> {
        Self::with_chart_output(&charts.output_dir, charts.width, charts.height)
    }

    /// Creates the service with an explicit chart output directory and
    /// canvas size.
    ///
    /// # Errors
    ///
    /// Returns a [`ChartError`] if the output directory cannot be created.
    pub fn with_chart_output(
        output_dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<Self, ChartError> {
        let mut tools = IndexMap::new();
        for (descriptor, handler) in math_tools::registrations()
            .into_iter()
            .chain(chart_tools::registrations())
        {
            let replaced = tools.insert(
                descriptor.name.clone(),
                RegisteredTool { descriptor, handler },
            );
            debug_assert!(replaced.is_none(), "duplicate tool registration");
        }

        tracing::info!(tool_count = tools.len(), "Tool registry built");

        Ok(Self {
            solver: MathSolver::new(),
            charts: ChartRenderer::new(output_dir, width, height)?,
            tools,
        })
    }
}

impl McpService for GatewayService {
    fn describe(&self) -> ServerDescription {
        ServerDescription {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Unified MCP server for mathematics and data visualization".to_string(),
            capabilities: json!({
                "tools": {"listChanged": false},
                "resources": {"subscribe": false, "listChanged": false},
            }),
        }
    }

    fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| tool.descriptor.clone())
            .collect()
    }

    fn call_tool(&self, name: &str, arguments: &Arguments) -> Result<Value, ServiceError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ServiceError::UnknownTool(name.to_string()))?;
        (tool.handler)(self, arguments)
    }

    fn list_resources(&self) -> Vec<ResourceDescriptor> {
        resources::descriptors()
    }

    fn read_resource(&self, uri: &str) -> Result<Value, ServiceError> {
        resources::read(uri).ok_or_else(|| ServiceError::UnknownResource(uri.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (GatewayService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let svc = GatewayService::with_chart_output(dir.path(), 960, 600).unwrap();
        (svc, dir)
    }

    #[test]
    fn registry_holds_all_fifteen_tools() {
        let (svc, _dir) = service();
        let tools = svc.list_tools();
        assert_eq!(tools.len(), 15);

        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        for expected in [
            "basic_arithmetic",
            "advanced_operations",
            "number_theory",
            "solve_equations",
            "geometry",
            "trigonometry",
            "logarithms",
            "fractions",
            "percentages",
            "evaluate_expression",
            "explain_concept",
            "create_chart",
            "plot_function",
            "create_statistics_chart",
            "visualize_geometry",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }

    #[test]
    fn listing_order_is_stable() {
        let (svc, _dir) = service();
        let first: Vec<String> = svc.list_tools().into_iter().map(|t| t.name).collect();
        let second: Vec<String> = svc.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(first, second);

        // Math tools come before chart tools, in registration order
        assert_eq!(first[0], "basic_arithmetic");
        assert_eq!(first[11], "create_chart");
    }

    #[test]
    fn tool_names_are_unique() {
        let (svc, _dir) = service();
        let mut names: Vec<String> = svc.list_tools().into_iter().map(|t| t.name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn unknown_tool_is_a_declared_error() {
        let (svc, _dir) = service();
        let err = svc.call_tool("frobnicate", &Arguments::new()).unwrap_err();
        assert!(matches!(err, ServiceError::UnknownTool(_)));
        assert_eq!(err.to_string(), "Unknown tool: frobnicate");
    }

    #[test]
    fn describe_reports_identity_and_capabilities() {
        let (svc, _dir) = service();
        let description = svc.describe();
        assert_eq!(description.name, "mathviz-mcp");
        assert_eq!(description.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(description.capabilities["tools"]["listChanged"], false);
        assert_eq!(description.capabilities["resources"]["subscribe"], false);
    }

    #[test]
    fn resources_surface_through_service() {
        let (svc, _dir) = service();
        assert_eq!(svc.list_resources().len(), 7);

        let payload = svc.read_resource("viz://examples/functions").unwrap();
        assert!(payload["contents"][0]["text"]
            .as_str()
            .unwrap()
            .contains("sin(x)"));

        let err = svc.read_resource("viz://examples/missing").unwrap_err();
        assert!(matches!(err, ServiceError::UnknownResource(_)));
    }
}
