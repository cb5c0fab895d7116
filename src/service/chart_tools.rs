//! The visualisation tools: argument schemas, typed argument structs, and
//! handlers delegating to [`crate::charts::ChartRenderer`].

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::gateway::{GatewayService, ToolHandler};
use super::{parse_args, ServiceError, ToolDescriptor};
use crate::charts::{ChartKind, ShapeKind};

/// Returns the descriptor and handler for every chart tool, in listing order.
pub(super) fn registrations() -> Vec<(ToolDescriptor, ToolHandler)> {
    vec![
        (create_chart_descriptor(), create_chart),
        (plot_function_descriptor(), plot_function),
        (create_statistics_chart_descriptor(), create_statistics_chart),
        (visualize_geometry_descriptor(), visualize_geometry),
    ]
}

// === create_chart ===

#[derive(Debug, Deserialize)]
struct CreateChartArgs {
    chart_type: ChartKind,
    data: Map<String, Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    xlabel: Option<String>,
    #[serde(default)]
    ylabel: Option<String>,
}

fn create_chart_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "create_chart".to_string(),
        description: "Create various types of charts and graphs".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "chart_type": {
                    "type": "string",
                    "enum": ["line", "bar", "scatter", "pie", "histogram", "box"],
                    "description": "Type of chart to create"
                },
                "data": {
                    "type": "object",
                    "description": "Data for the chart (x, y values or categories)"
                },
                "title": {
                    "type": "string",
                    "description": "Chart title"
                },
                "xlabel": {
                    "type": "string",
                    "description": "X-axis label"
                },
                "ylabel": {
                    "type": "string",
                    "description": "Y-axis label"
                }
            },
            "required": ["chart_type", "data"]
        }),
    }
}

fn create_chart(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: CreateChartArgs = parse_args(arguments)?;
    svc.charts
        .create_chart(
            args.chart_type,
            &Value::Object(args.data),
            args.title.as_deref(),
            args.xlabel.as_deref(),
            args.ylabel.as_deref(),
        )
        .map_err(|e| ServiceError::Execution(e.to_string()))
}

// === plot_function ===

fn default_x_range() -> [f64; 2] {
    [-10.0, 10.0]
}

const fn default_num_points() -> usize {
    1000
}

#[derive(Debug, Deserialize)]
struct PlotFunctionArgs {
    expression: String,
    #[serde(default = "default_x_range")]
    x_range: [f64; 2],
    #[serde(default = "default_num_points")]
    num_points: usize,
    #[serde(default)]
    title: Option<String>,
}

fn plot_function_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "plot_function".to_string(),
        description: "Plot mathematical functions".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Mathematical expression to plot (e.g., 'x**2', 'sin(x)')"
                },
                "x_range": {
                    "type": "array",
                    "items": {"type": "number"},
                    "minItems": 2,
                    "maxItems": 2,
                    "description": "Range for x values [min, max]",
                    "default": [-10, 10]
                },
                "num_points": {
                    "type": "integer",
                    "description": "Number of points to plot",
                    "default": 1000,
                    "minimum": 10,
                    "maximum": 10000
                },
                "title": {
                    "type": "string",
                    "description": "Plot title"
                }
            },
            "required": ["expression"]
        }),
    }
}

fn plot_function(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: PlotFunctionArgs = parse_args(arguments)?;
    svc.charts
        .plot_function(
            &args.expression,
            (args.x_range[0], args.x_range[1]),
            args.num_points,
            args.title.as_deref(),
        )
        .map_err(|e| ServiceError::Execution(e.to_string()))
}

// === create_statistics_chart ===

fn default_statistics_kind() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize)]
struct StatisticsChartArgs {
    data: Vec<f64>,
    #[serde(default = "default_statistics_kind")]
    chart_type: String,
    #[serde(default)]
    title: Option<String>,
}

fn create_statistics_chart_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "create_statistics_chart".to_string(),
        description: "Create statistical visualizations for data analysis".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "data": {
                    "type": "array",
                    "items": {"type": "number"},
                    "description": "Numerical data for statistical analysis"
                },
                "chart_type": {
                    "type": "string",
                    "enum": ["all"],
                    "description": "Type of statistical visualization",
                    "default": "all"
                },
                "title": {
                    "type": "string",
                    "description": "Chart title"
                }
            },
            "required": ["data"]
        }),
    }
}

fn create_statistics_chart(
    svc: &GatewayService,
    arguments: &super::Arguments,
) -> Result<Value, ServiceError> {
    let args: StatisticsChartArgs = parse_args(arguments)?;
    svc.charts
        .create_statistics_chart(&args.data, &args.chart_type, args.title.as_deref())
        .map_err(|e| ServiceError::Execution(e.to_string()))
}

// === visualize_geometry ===

#[derive(Debug, Deserialize)]
struct VisualizeGeometryArgs {
    shape_type: ShapeKind,
    parameters: Map<String, Value>,
    #[serde(default)]
    title: Option<String>,
}

fn visualize_geometry_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "visualize_geometry".to_string(),
        description: "Visualize geometric shapes".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "shape_type": {
                    "type": "string",
                    "enum": ["circle", "rectangle", "triangle", "polygon"],
                    "description": "Type of geometric shape to visualize"
                },
                "parameters": {
                    "type": "object",
                    "description": "Shape-specific parameters (e.g., radius for circle, vertices for polygon)"
                },
                "title": {
                    "type": "string",
                    "description": "Visualization title"
                }
            },
            "required": ["shape_type", "parameters"]
        }),
    }
}

fn visualize_geometry(
    svc: &GatewayService,
    arguments: &super::Arguments,
) -> Result<Value, ServiceError> {
    let args: VisualizeGeometryArgs = parse_args(arguments)?;
    svc.charts
        .visualize_geometry(
            args.shape_type,
            &Value::Object(args.parameters),
            args.title.as_deref(),
        )
        .map_err(|e| ServiceError::Execution(e.to_string()))
}
