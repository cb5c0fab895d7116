//! Static reference resources served over resources/list and resources/read.
//!
//! Resources are a flat table of opaque URIs with exact-match lookup. The
//! payload shape is `{"contents": [{"type": "text", "text": ...}]}`.

use serde_json::{json, Value};

use super::ResourceDescriptor;

struct StaticResource {
    uri: &'static str,
    name: &'static str,
    description: &'static str,
    mime_type: &'static str,
    text: &'static str,
}

/// Returns descriptors for every registered resource, in table order.
pub(super) fn descriptors() -> Vec<ResourceDescriptor> {
    RESOURCES
        .iter()
        .map(|r| ResourceDescriptor {
            uri: r.uri.to_string(),
            name: r.name.to_string(),
            description: r.description.to_string(),
            mime_type: r.mime_type.to_string(),
        })
        .collect()
}

/// Looks up a resource payload by exact URI match.
pub(super) fn read(uri: &str) -> Option<Value> {
    RESOURCES.iter().find(|r| r.uri == uri).map(|r| {
        json!({
            "contents": [{
                "type": "text",
                "text": r.text,
            }]
        })
    })
}

const RESOURCES: &[StaticResource] = &[
    StaticResource {
        uri: "math://concepts/elementary",
        name: "Elementary Math Concepts",
        description: "Basic arithmetic and foundational concepts",
        mime_type: "text/plain",
        text: "\
Elementary Math Concepts

**Addition & Subtraction**
- Addition: Combining numbers to find a total
- Subtraction: Taking away or finding the difference
- Number line: Visual tool for understanding operations

**Multiplication & Division**
- Multiplication: Repeated addition or groups of equal size
- Division: Sharing equally or finding how many groups
- Times tables: Foundation for mental math

**Place Value**
- Ones, tens, hundreds places
- Reading and writing numbers
- Comparing numbers using <, >, =

**Basic Fractions**
- Parts of a whole
- Simple fraction addition/subtraction
- Comparing fractions",
    },
    StaticResource {
        uri: "math://concepts/middle",
        name: "Middle School Math Concepts",
        description: "Fractions, decimals, basic algebra",
        mime_type: "text/plain",
        text: "\
Middle School Math Concepts

**Fractions & Decimals**
- Equivalent fractions
- Adding/subtracting fractions with different denominators
- Converting between fractions and decimals
- Ordering fractions and decimals

**Percentages**
- Understanding percent as \"out of 100\"
- Converting between fractions, decimals, and percentages
- Finding percentages of numbers
- Percentage increase/decrease

**Basic Algebra**
- Variables and expressions
- Solving simple equations
- Graphing linear relationships
- Order of operations (PEMDAS)

**Geometry**
- Area and perimeter
- Volume of simple shapes
- Coordinate graphing
- Basic angle relationships",
    },
    StaticResource {
        uri: "math://concepts/high_school",
        name: "High School Math Concepts",
        description: "Advanced algebra, geometry, trigonometry",
        mime_type: "text/plain",
        text: "\
High School Math Concepts

**Advanced Algebra**
- Quadratic equations and graphing
- Systems of equations
- Exponential and logarithmic functions
- Polynomial operations

**Geometry & Trigonometry**
- Pythagorean theorem applications
- Trigonometric ratios (sin, cos, tan)
- Circle theorems
- Volume and surface area

**Statistics & Probability**
- Mean, median, mode, range
- Standard deviation
- Probability calculations
- Data analysis and interpretation

**Pre-Calculus**
- Function composition
- Inverse functions
- Limits (introduction)
- Sequences and series",
    },
    StaticResource {
        uri: "math://formulas/geometry",
        name: "Geometry Formulas",
        description: "Common geometric formulas and equations",
        mime_type: "text/plain",
        text: "\
Geometry Formulas

**Area Formulas**
- Rectangle: A = length × width
- Circle: A = π × r²
- Triangle: A = ½ × base × height
- Parallelogram: A = base × height
- Trapezoid: A = ½ × (base₁ + base₂) × height

**Volume Formulas**
- Rectangular prism: V = length × width × height
- Cylinder: V = π × r² × height
- Sphere: V = ⁴⁄₃ × π × r³
- Cone: V = ⅓ × π × r² × height

**Distance & Slope**
- Distance formula: d = √[(x₂-x₁)² + (y₂-y₁)²]
- Slope formula: m = (y₂-y₁)/(x₂-x₁)
- Midpoint formula: ((x₁+x₂)/2, (y₁+y₂)/2)

**Circle Properties**
- Circumference: C = 2πr
- Arc length: s = rθ (θ in radians)
- Sector area: A = ½r²θ",
    },
    StaticResource {
        uri: "math://formulas/algebra",
        name: "Algebra Formulas",
        description: "Algebraic formulas and identities",
        mime_type: "text/plain",
        text: "\
Algebra Formulas

**Quadratic Formula**
- x = (-b ± √(b²-4ac))/(2a)
- For equations of the form ax² + bx + c = 0

**Exponent Rules**
- x^a × x^b = x^(a+b)
- x^a ÷ x^b = x^(a-b)
- (x^a)^b = x^(ab)
- x^0 = 1
- x^(-a) = 1/x^a

**Logarithm Properties**
- log(xy) = log(x) + log(y)
- log(x/y) = log(x) - log(y)
- log(x^n) = n × log(x)
- log_b(b^x) = x

**Factoring Patterns**
- Difference of squares: a² - b² = (a+b)(a-b)
- Perfect square trinomial: a² + 2ab + b² = (a+b)²
- Sum/difference of cubes: a³ ± b³ = (a ± b)(a² ∓ ab + b²)",
    },
    StaticResource {
        uri: "viz://examples/charts",
        name: "Chart Examples",
        description: "Examples of different chart types and their data formats",
        mime_type: "application/json",
        text: "\
Chart Data Format Examples

**Line Chart:**
{
  \"chart_type\": \"line\",
  \"data\": {
    \"x\": [1, 2, 3, 4, 5],
    \"y\": [2, 4, 6, 8, 10]
  }
}

**Bar Chart:**
{
  \"chart_type\": \"bar\",
  \"data\": {
    \"categories\": [\"A\", \"B\", \"C\"],
    \"values\": [10, 20, 15]
  }
}

**Scatter Plot:**
{
  \"chart_type\": \"scatter\",
  \"data\": {
    \"x\": [1, 2, 3, 4, 5],
    \"y\": [2, 4, 6, 8, 10],
    \"colors\": [1, 2, 3, 4, 5],
    \"sizes\": [20, 40, 60, 80, 100]
  }
}

**Pie Chart:**
{
  \"chart_type\": \"pie\",
  \"data\": {
    \"labels\": [\"Category A\", \"Category B\", \"Category C\"],
    \"values\": [30, 45, 25]
  }
}

**Histogram:**
{
  \"chart_type\": \"histogram\",
  \"data\": {
    \"values\": [1, 2, 2, 3, 3, 3, 4, 4, 5],
    \"bins\": 10
  }
}",
    },
    StaticResource {
        uri: "viz://examples/functions",
        name: "Function Plotting Examples",
        description: "Examples of mathematical function expressions for plotting",
        mime_type: "text/plain",
        text: "\
Mathematical Function Examples for Plotting

**Linear Functions:**
- \"x\" - Simple line
- \"2*x + 3\" - Line with slope and intercept
- \"-0.5*x + 4\" - Negative slope

**Quadratic Functions:**
- \"x**2\" - Basic parabola
- \"x**2 - 4*x + 3\" - Parabola with roots
- \"-2*x**2 + 8*x - 6\" - Downward parabola

**Trigonometric Functions:**
- \"sin(x)\" - Sine wave
- \"cos(x)\" - Cosine wave
- \"tan(x)\" - Tangent function
- \"2*sin(3*x)\" - Amplitude and frequency modulation

**Exponential Functions:**
- \"exp(x)\" - Natural exponential
- \"exp(-x**2)\" - Gaussian function

**Logarithmic Functions:**
- \"log(x)\" - Natural logarithm
- \"log(abs(x))\" - Logarithm with absolute value

**Combined Functions:**
- \"x*sin(x)\" - Product of linear and sine
- \"exp(-x**2)*cos(5*x)\" - Modulated Gaussian
- \"sqrt(abs(x))\" - Square root function

**Note:** Available functions: sin, cos, tan, exp, log, sqrt, abs; constants: pi, e",
    },
];
