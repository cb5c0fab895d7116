//! The mathematics tools: argument schemas, typed argument structs, and
//! handlers delegating to [`crate::solver::MathSolver`].
//!
//! Arguments are validated once at the deserialisation boundary; each
//! handler receives a strongly-typed struct. Enumerated operations are serde
//! enums, so an out-of-range value is an invalid-parameters error before any
//! solver code runs.

use serde::Deserialize;
use serde_json::{json, Value};

use super::gateway::{GatewayService, ToolHandler};
use super::{parse_args, ServiceError, ToolDescriptor};
use crate::solver::{AngleUnit, ConceptLevel};

/// Returns the descriptor and handler for every math tool, in listing order.
pub(super) fn registrations() -> Vec<(ToolDescriptor, ToolHandler)> {
    vec![
        (basic_arithmetic_descriptor(), basic_arithmetic),
        (advanced_operations_descriptor(), advanced_operations),
        (number_theory_descriptor(), number_theory),
        (solve_equations_descriptor(), solve_equations),
        (geometry_descriptor(), geometry),
        (trigonometry_descriptor(), trigonometry),
        (logarithms_descriptor(), logarithms),
        (fractions_descriptor(), fractions),
        (percentages_descriptor(), percentages),
        (evaluate_expression_descriptor(), evaluate_expression),
        (explain_concept_descriptor(), explain_concept),
    ]
}

// === basic_arithmetic ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Deserialize)]
struct ArithmeticArgs {
    operation: ArithmeticOp,
    a: f64,
    b: f64,
}

fn basic_arithmetic_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "basic_arithmetic".to_string(),
        description: "Perform basic arithmetic operations (add, subtract, multiply, divide)"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["add", "subtract", "multiply", "divide"],
                    "description": "The arithmetic operation to perform"
                },
                "a": {"type": "number", "description": "First number"},
                "b": {"type": "number", "description": "Second number"}
            },
            "required": ["operation", "a", "b"]
        }),
    }
}

fn basic_arithmetic(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: ArithmeticArgs = parse_args(arguments)?;
    Ok(match args.operation {
        ArithmeticOp::Add => svc.solver.add(args.a, args.b),
        ArithmeticOp::Subtract => svc.solver.subtract(args.a, args.b),
        ArithmeticOp::Multiply => svc.solver.multiply(args.a, args.b),
        ArithmeticOp::Divide => svc.solver.divide(args.a, args.b),
    })
}

// === advanced_operations ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AdvancedOp {
    Power,
    Sqrt,
    Factorial,
    Abs,
    RoundNumber,
}

#[derive(Debug, Deserialize)]
struct AdvancedArgs {
    operation: AdvancedOp,
    value: f64,
    #[serde(default)]
    extra_param: f64,
}

fn advanced_operations_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "advanced_operations".to_string(),
        description: "Perform advanced mathematical operations (power, sqrt, factorial, abs, round)"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["power", "sqrt", "factorial", "abs", "round_number"],
                    "description": "The operation to perform"
                },
                "value": {"type": "number", "description": "Input value"},
                "extra_param": {
                    "type": "number",
                    "description": "Extra parameter if needed (e.g., exponent for power, decimal places for rounding)",
                    "default": 0
                }
            },
            "required": ["operation", "value"]
        }),
    }
}

fn advanced_operations(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: AdvancedArgs = parse_args(arguments)?;
    Ok(match args.operation {
        AdvancedOp::Power => svc.solver.power(args.value, args.extra_param),
        AdvancedOp::Sqrt => svc.solver.sqrt(args.value),
        AdvancedOp::Factorial => svc.solver.factorial(args.value),
        AdvancedOp::Abs => svc.solver.abs(args.value),
        AdvancedOp::RoundNumber => svc.solver.round_number(args.value, args.extra_param as i32),
    })
}

// === number_theory ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum NumberTheoryOp {
    Gcd,
    Lcm,
    PrimeFactors,
    IsPrime,
}

#[derive(Debug, Deserialize)]
struct NumberTheoryArgs {
    operation: NumberTheoryOp,
    a: i64,
    #[serde(default)]
    b: i64,
}

fn number_theory_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "number_theory".to_string(),
        description: "Number theory operations (GCD, LCM, prime factors, primality test)"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["gcd", "lcm", "prime_factors", "is_prime"],
                    "description": "The number theory operation"
                },
                "a": {"type": "integer", "description": "First integer"},
                "b": {"type": "integer", "description": "Second integer (for GCD/LCM)", "default": 0}
            },
            "required": ["operation", "a"]
        }),
    }
}

fn number_theory(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: NumberTheoryArgs = parse_args(arguments)?;
    Ok(match args.operation {
        NumberTheoryOp::Gcd => svc.solver.gcd(args.a, args.b),
        NumberTheoryOp::Lcm => svc.solver.lcm(args.a, args.b),
        NumberTheoryOp::PrimeFactors => svc.solver.prime_factors(args.a),
        NumberTheoryOp::IsPrime => svc.solver.is_prime(args.a),
    })
}

// === solve_equations ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum EquationType {
    Linear,
    Quadratic,
}

#[derive(Debug, Deserialize)]
struct EquationArgs {
    equation_type: EquationType,
    a: f64,
    b: f64,
    #[serde(default)]
    c: f64,
}

fn solve_equations_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "solve_equations".to_string(),
        description: "Solve linear and quadratic equations with step-by-step explanations"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "equation_type": {
                    "type": "string",
                    "enum": ["linear", "quadratic"],
                    "description": "Type of equation to solve"
                },
                "a": {"type": "number", "description": "Coefficient a (for ax+b=0 or ax²+bx+c=0)"},
                "b": {"type": "number", "description": "Coefficient b"},
                "c": {"type": "number", "description": "Coefficient c (for quadratic only)", "default": 0}
            },
            "required": ["equation_type", "a", "b"]
        }),
    }
}

fn solve_equations(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: EquationArgs = parse_args(arguments)?;
    Ok(match args.equation_type {
        EquationType::Linear => svc.solver.solve_linear(args.a, args.b),
        EquationType::Quadratic => svc.solver.solve_quadratic(args.a, args.b, args.c),
    })
}

// === geometry ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum GeometryOp {
    AreaCircle,
    AreaRectangle,
    AreaTriangle,
    Pythagorean,
    Distance,
    Slope,
    Midpoint,
}

impl GeometryOp {
    const fn arity(&self) -> usize {
        match self {
            Self::AreaCircle => 1,
            Self::AreaRectangle | Self::AreaTriangle | Self::Pythagorean => 2,
            Self::Distance | Self::Slope | Self::Midpoint => 4,
        }
    }

    const fn name(&self) -> &'static str {
        match self {
            Self::AreaCircle => "area_circle",
            Self::AreaRectangle => "area_rectangle",
            Self::AreaTriangle => "area_triangle",
            Self::Pythagorean => "pythagorean",
            Self::Distance => "distance",
            Self::Slope => "slope",
            Self::Midpoint => "midpoint",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeometryArgs {
    operation: GeometryOp,
    values: Vec<f64>,
}

fn geometry_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "geometry".to_string(),
        description: "Calculate areas, distances, and other geometric properties".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["area_circle", "area_rectangle", "area_triangle", "pythagorean", "distance", "slope", "midpoint"],
                    "description": "Geometric operation"
                },
                "values": {
                    "type": "array",
                    "items": {"type": "number"},
                    "description": "Array of values needed for the operation"
                }
            },
            "required": ["operation", "values"]
        }),
    }
}

fn geometry(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: GeometryArgs = parse_args(arguments)?;

    let arity = args.operation.arity();
    if args.values.len() < arity {
        return Err(ServiceError::InvalidParameters(format!(
            "geometry operation '{}' requires {arity} value(s), got {}",
            args.operation.name(),
            args.values.len()
        )));
    }
    let v = &args.values;

    Ok(match args.operation {
        GeometryOp::AreaCircle => svc.solver.area_circle(v[0]),
        GeometryOp::AreaRectangle => svc.solver.area_rectangle(v[0], v[1]),
        GeometryOp::AreaTriangle => svc.solver.area_triangle(v[0], v[1]),
        GeometryOp::Pythagorean => svc.solver.pythagorean(v[0], v[1]),
        GeometryOp::Distance => svc.solver.distance(v[0], v[1], v[2], v[3]),
        GeometryOp::Slope => svc.solver.slope(v[0], v[1], v[2], v[3]),
        GeometryOp::Midpoint => svc.solver.midpoint(v[0], v[1], v[2], v[3]),
    })
}

// === trigonometry ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TrigFunction {
    Sin,
    Cos,
    Tan,
}

#[derive(Debug, Deserialize)]
struct TrigArgs {
    function: TrigFunction,
    angle: f64,
    #[serde(default)]
    unit: AngleUnit,
}

fn trigonometry_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "trigonometry".to_string(),
        description: "Trigonometric functions (sin, cos, tan)".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "function": {
                    "type": "string",
                    "enum": ["sin", "cos", "tan"],
                    "description": "Trigonometric function"
                },
                "angle": {"type": "number", "description": "Angle value"},
                "unit": {
                    "type": "string",
                    "enum": ["radians", "degrees"],
                    "description": "Angle unit",
                    "default": "radians"
                }
            },
            "required": ["function", "angle"]
        }),
    }
}

fn trigonometry(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: TrigArgs = parse_args(arguments)?;
    Ok(match args.function {
        TrigFunction::Sin => svc.solver.sin(args.angle, args.unit),
        TrigFunction::Cos => svc.solver.cos(args.angle, args.unit),
        TrigFunction::Tan => svc.solver.tan(args.angle, args.unit),
    })
}

// === logarithms ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LogType {
    Log,
    Log10,
}

#[derive(Debug, Deserialize)]
struct LogArgs {
    log_type: LogType,
    x: f64,
    #[serde(default)]
    base: Option<f64>,
}

fn logarithms_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "logarithms".to_string(),
        description: "Logarithmic functions".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "log_type": {
                    "type": "string",
                    "enum": ["log", "log10"],
                    "description": "Type of logarithm"
                },
                "x": {"type": "number", "description": "Input value"},
                "base": {
                    "type": "number",
                    "description": "Base for logarithm (default: e)",
                    "default": std::f64::consts::E
                }
            },
            "required": ["log_type", "x"]
        }),
    }
}

fn logarithms(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: LogArgs = parse_args(arguments)?;
    Ok(match args.log_type {
        LogType::Log => svc
            .solver
            .log(args.x, args.base.unwrap_or(std::f64::consts::E)),
        LogType::Log10 => svc.solver.log10(args.x),
    })
}

// === fractions ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FractionOp {
    SimplifyFraction,
    ConvertToDecimal,
    ConvertToFraction,
}

#[derive(Debug, Deserialize)]
struct FractionArgs {
    operation: FractionOp,
    #[serde(default)]
    numerator: Option<i64>,
    #[serde(default)]
    denominator: Option<i64>,
    #[serde(default)]
    decimal: Option<f64>,
}

fn fractions_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "fractions".to_string(),
        description: "Work with fractions (simplify, convert to/from decimal)".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["simplify_fraction", "convert_to_decimal", "convert_to_fraction"],
                    "description": "Fraction operation"
                },
                "numerator": {"type": "integer", "description": "Numerator (for fraction operations)"},
                "denominator": {"type": "integer", "description": "Denominator (for fraction operations)"},
                "decimal": {"type": "number", "description": "Decimal value (for decimal to fraction conversion)"}
            },
            "required": ["operation"]
        }),
    }
}

fn fractions(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: FractionArgs = parse_args(arguments)?;

    match args.operation {
        FractionOp::SimplifyFraction | FractionOp::ConvertToDecimal => {
            let numerator = args
                .numerator
                .ok_or(ServiceError::MissingParameter("numerator"))?;
            let denominator = args
                .denominator
                .ok_or(ServiceError::MissingParameter("denominator"))?;

            Ok(match args.operation {
                FractionOp::SimplifyFraction => svc.solver.simplify_fraction(numerator, denominator),
                _ => svc.solver.convert_to_decimal(numerator, denominator),
            })
        }
        FractionOp::ConvertToFraction => {
            let decimal = args.decimal.ok_or(ServiceError::MissingParameter("decimal"))?;
            Ok(svc.solver.convert_to_fraction(decimal))
        }
    }
}

// === percentages ===

#[derive(Debug, Deserialize)]
struct PercentageArgs {
    part: f64,
    whole: f64,
}

fn percentages_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "percentages".to_string(),
        description: "Calculate percentages".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "part": {"type": "number", "description": "Part value"},
                "whole": {"type": "number", "description": "Whole value"}
            },
            "required": ["part", "whole"]
        }),
    }
}

fn percentages(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: PercentageArgs = parse_args(arguments)?;
    Ok(svc.solver.percentage(args.part, args.whole))
}

// === evaluate_expression ===

#[derive(Debug, Deserialize)]
struct ExpressionArgs {
    expression: String,
}

fn evaluate_expression_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "evaluate_expression".to_string(),
        description: "Safely evaluate mathematical expressions".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Mathematical expression to evaluate (supports +, -, *, /, ^, parentheses)"
                }
            },
            "required": ["expression"]
        }),
    }
}

fn evaluate_expression(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: ExpressionArgs = parse_args(arguments)?;
    Ok(svc.solver.evaluate_expression(&args.expression))
}

// === explain_concept ===

#[derive(Debug, Deserialize)]
struct ConceptArgs {
    concept: String,
    #[serde(default)]
    level: ConceptLevel,
}

fn explain_concept_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "explain_concept".to_string(),
        description: "Explain mathematical concepts with examples".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "concept": {
                    "type": "string",
                    "description": "Mathematical concept to explain"
                },
                "level": {
                    "type": "string",
                    "enum": ["elementary", "middle", "high_school"],
                    "description": "Educational level for explanation",
                    "default": "middle"
                }
            },
            "required": ["concept"]
        }),
    }
}

fn explain_concept(svc: &GatewayService, arguments: &super::Arguments) -> Result<Value, ServiceError> {
    let args: ConceptArgs = parse_args(arguments)?;
    Ok(svc.solver.explain_concept(&args.concept, args.level))
}

#[cfg(test)]
mod tests {
    use super::super::{Arguments, McpService};
    use super::*;

    fn args(json: Value) -> Arguments {
        json.as_object().cloned().expect("object")
    }

    fn service() -> (GatewayService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let svc = GatewayService::with_chart_output(dir.path(), 960, 600).unwrap();
        (svc, dir)
    }

    #[test]
    fn arithmetic_add() {
        let (svc, _dir) = service();
        let result = svc
            .call_tool("basic_arithmetic", &args(json!({"operation": "add", "a": 5, "b": 3})))
            .unwrap();
        assert_eq!(result["result"], 8);
    }

    #[test]
    fn arithmetic_rejects_unknown_operation() {
        let (svc, _dir) = service();
        let err = svc
            .call_tool("basic_arithmetic", &args(json!({"operation": "modulo", "a": 5, "b": 3})))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidParameters(_)));
    }

    #[test]
    fn arithmetic_rejects_missing_operand() {
        let (svc, _dir) = service();
        let err = svc
            .call_tool("basic_arithmetic", &args(json!({"operation": "add", "a": 5})))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidParameters(_)));
    }

    #[test]
    fn advanced_operations_with_default_extra_param() {
        let (svc, _dir) = service();
        let result = svc
            .call_tool("advanced_operations", &args(json!({"operation": "sqrt", "value": 16})))
            .unwrap();
        assert_eq!(result["result"], 4);

        let result = svc
            .call_tool(
                "advanced_operations",
                &args(json!({"operation": "power", "value": 2, "extra_param": 10})),
            )
            .unwrap();
        assert_eq!(result["result"], 1024);
    }

    #[test]
    fn geometry_arity_check() {
        let (svc, _dir) = service();
        let err = svc
            .call_tool("geometry", &args(json!({"operation": "distance", "values": [0, 0]})))
            .unwrap_err();
        let ServiceError::InvalidParameters(message) = err else {
            panic!("expected invalid parameters");
        };
        assert!(message.contains("distance"));
        assert!(message.contains('4'));
    }

    #[test]
    fn trigonometry_defaults_to_radians() {
        let (svc, _dir) = service();
        let result = svc
            .call_tool("trigonometry", &args(json!({"function": "cos", "angle": 0})))
            .unwrap();
        assert_eq!(result["result"], 1);
    }

    #[test]
    fn fractions_require_operation_specific_params() {
        let (svc, _dir) = service();
        let err = svc
            .call_tool("fractions", &args(json!({"operation": "simplify_fraction"})))
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter("numerator")));

        let err = svc
            .call_tool("fractions", &args(json!({"operation": "convert_to_fraction"})))
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter("decimal")));

        let result = svc
            .call_tool(
                "fractions",
                &args(json!({"operation": "simplify_fraction", "numerator": 6, "denominator": 8})),
            )
            .unwrap();
        assert_eq!(result["result"], json!([3, 4]));
    }

    #[test]
    fn explain_concept_defaults_to_middle() {
        let (svc, _dir) = service();
        let result = svc
            .call_tool("explain_concept", &args(json!({"concept": "fractions"})))
            .unwrap();
        assert_eq!(result["level"], "middle");
    }
}
