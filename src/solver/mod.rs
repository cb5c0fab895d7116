//! Mathematical solver backing the math tools.
//!
//! Every operation returns a JSON payload with `result`, `explanation`, and
//! `steps` fields. Domain violations (division by zero, square root of a
//! negative) are reported as payloads with an `error` field rather than as
//! protocol errors: the tool call itself succeeded, the mathematics did not.

use serde_json::{json, Value};

use crate::expr;

/// Angle unit for the trigonometric operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    /// Angles in radians (the default).
    #[default]
    Radians,
    /// Angles in degrees.
    Degrees,
}

impl AngleUnit {
    const fn label(self) -> &'static str {
        match self {
            Self::Radians => "radians",
            Self::Degrees => "degrees",
        }
    }
}

/// Educational level for concept explanations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptLevel {
    /// Elementary school.
    Elementary,
    /// Middle school (the default).
    #[default]
    Middle,
    /// High school.
    HighSchool,
}

impl ConceptLevel {
    const fn label(self) -> &'static str {
        match self {
            Self::Elementary => "elementary",
            Self::Middle => "middle",
            Self::HighSchool => "high_school",
        }
    }
}

/// Formats a float the way the payloads expect: integer-valued floats print
/// without a trailing `.0`.
#[allow(clippy::cast_possible_truncation)] // fract() == 0.0 checked
fn fmt(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Converts a float to a JSON number, collapsing exact integer values.
#[allow(clippy::cast_possible_truncation)] // fract() == 0.0 checked
fn num(v: f64) -> Value {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        json!(v as i64)
    } else {
        json!(v)
    }
}

fn solution(result: Value, explanation: String, steps: Vec<String>) -> Value {
    json!({
        "result": result,
        "explanation": explanation,
        "steps": steps,
    })
}

fn failure(error: impl Into<String>, explanation: impl Into<String>) -> Value {
    json!({
        "error": error.into(),
        "explanation": explanation.into(),
    })
}

/// Math problem solver with step-by-step explanations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathSolver;

impl MathSolver {
    /// Creates a new solver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    // === Basic arithmetic ===

    /// Adds two numbers.
    #[must_use]
    pub fn add(self, a: f64, b: f64) -> Value {
        let result = a + b;
        solution(
            num(result),
            format!("Addition: {} + {} = {}", fmt(a), fmt(b), fmt(result)),
            vec![
                format!("Add {} and {}", fmt(a), fmt(b)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    /// Subtracts `b` from `a`.
    #[must_use]
    pub fn subtract(self, a: f64, b: f64) -> Value {
        let result = a - b;
        solution(
            num(result),
            format!("Subtraction: {} - {} = {}", fmt(a), fmt(b), fmt(result)),
            vec![
                format!("Subtract {} from {}", fmt(b), fmt(a)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    /// Multiplies two numbers.
    #[must_use]
    pub fn multiply(self, a: f64, b: f64) -> Value {
        let result = a * b;
        solution(
            num(result),
            format!("Multiplication: {} × {} = {}", fmt(a), fmt(b), fmt(result)),
            vec![
                format!("Multiply {} by {}", fmt(a), fmt(b)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    /// Divides `a` by `b`.
    #[must_use]
    pub fn divide(self, a: f64, b: f64) -> Value {
        if b == 0.0 {
            return failure("Division by zero is undefined", "Cannot divide by zero");
        }
        let result = a / b;
        solution(
            num(result),
            format!("Division: {} ÷ {} = {}", fmt(a), fmt(b), fmt(result)),
            vec![
                format!("Divide {} by {}", fmt(a), fmt(b)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    // === Advanced operations ===

    /// Raises `base` to `exponent`.
    #[must_use]
    pub fn power(self, base: f64, exponent: f64) -> Value {
        let result = base.powf(exponent);
        if !result.is_finite() {
            return failure(
                "Error in power calculation: result is not finite",
                "Power calculation resulted in an error",
            );
        }
        solution(
            num(result),
            format!("Exponentiation: {}^{} = {}", fmt(base), fmt(exponent), fmt(result)),
            vec![
                format!("Raise {} to the power of {}", fmt(base), fmt(exponent)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    /// Square root of `n`.
    #[must_use]
    pub fn sqrt(self, n: f64) -> Value {
        if n < 0.0 {
            return failure(
                "Square root of negative number is not real",
                "Cannot take square root of negative numbers in real numbers",
            );
        }
        let result = n.sqrt();
        solution(
            num(result),
            format!("Square root: √{} = {}", fmt(n), fmt(result)),
            vec![
                format!("Calculate square root of {}", fmt(n)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    /// Factorial of `n`.
    ///
    /// Exact for `n <= 20`; larger values are computed in floating point.
    /// Values above 170 overflow and are rejected.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn factorial(self, n: f64) -> Value {
        if n < 0.0 || n.fract() != 0.0 {
            return failure(
                "Factorial is only defined for non-negative integers",
                "Factorial requires a non-negative integer",
            );
        }
        if n > 170.0 {
            return failure(
                "Number too large for factorial calculation",
                "Factorial of numbers > 170 causes overflow",
            );
        }

        let n_int = n as u64;
        let result = if n_int <= 20 {
            json!((1..=n_int).product::<u64>())
        } else {
            json!((1..=n_int).map(|i| i as f64).product::<f64>())
        };

        solution(
            result.clone(),
            format!("Factorial: {n_int}! = {}", payload_text(&result)),
            vec![
                format!("Calculate {n_int}!"),
                format!("Result: {}", payload_text(&result)),
            ],
        )
    }

    /// Absolute value of `x`.
    #[must_use]
    pub fn abs(self, x: f64) -> Value {
        let result = x.abs();
        solution(
            num(result),
            format!("Absolute value: |{}| = {}", fmt(x), fmt(result)),
            vec![
                format!("Take absolute value of {}", fmt(x)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    /// Rounds `x` to `decimals` decimal places.
    #[must_use]
    pub fn round_number(self, x: f64, decimals: i32) -> Value {
        let factor = 10f64.powi(decimals);
        let result = (x * factor).round() / factor;
        solution(
            num(result),
            format!("Round {} to {decimals} decimal places: {}", fmt(x), fmt(result)),
            vec![
                format!("Round {} to {decimals} decimal places", fmt(x)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    // === Number theory ===

    /// Greatest common divisor of `a` and `b`.
    #[must_use]
    pub fn gcd(self, a: i64, b: i64) -> Value {
        let result = gcd(a.unsigned_abs(), b.unsigned_abs());
        solution(
            json!(result),
            format!("Greatest Common Divisor of {a} and {b} is {result}"),
            vec![
                format!("Find GCD of {a} and {b}"),
                format!("Result: {result}"),
            ],
        )
    }

    /// Least common multiple of `a` and `b`.
    #[must_use]
    pub fn lcm(self, a: i64, b: i64) -> Value {
        if a == 0 || b == 0 {
            return solution(
                json!(0),
                "LCM with zero is zero".to_string(),
                vec!["One number is zero".to_string(), "LCM = 0".to_string()],
            );
        }

        let gcd_val = gcd(a.unsigned_abs(), b.unsigned_abs());
        let result = a.unsigned_abs() / gcd_val * b.unsigned_abs();
        solution(
            json!(result),
            format!("Least Common Multiple of {a} and {b} is {result}"),
            vec![
                "LCM = |a × b| / GCD(a, b)".to_string(),
                format!("GCD({a}, {b}) = {gcd_val}"),
                format!("LCM = |{a} × {b}| / {gcd_val} = {result}"),
            ],
        )
    }

    /// Prime factorisation of `n`.
    #[must_use]
    pub fn prime_factors(self, n: i64) -> Value {
        let n = n.unsigned_abs();
        if n < 2 {
            return solution(
                json!([]),
                format!("{n} has no prime factors"),
                vec!["Numbers less than 2 have no prime factors".to_string()],
            );
        }

        let mut factors = Vec::new();
        let mut remaining = n;
        let mut d = 2u64;
        while d * d <= remaining {
            while remaining % d == 0 {
                factors.push(d);
                remaining /= d;
            }
            d += 1;
        }
        if remaining > 1 {
            factors.push(remaining);
        }

        solution(
            json!(factors),
            format!("Prime factors: {factors:?}"),
            vec![format!("Factor {n}"), format!("Prime factors: {factors:?}")],
        )
    }

    /// Primality test for `n`.
    #[must_use]
    pub fn is_prime(self, n: i64) -> Value {
        if n < 2 {
            return solution(
                json!(false),
                format!("{n} is not prime (numbers < 2 are not prime)"),
                vec![
                    format!("Check if {n} is prime"),
                    "Numbers less than 2 are not prime".to_string(),
                ],
            );
        }

        let n = n.unsigned_abs();
        let mut i = 2u64;
        while i * i <= n {
            if n % i == 0 {
                return solution(
                    json!(false),
                    format!("{n} is not prime (divisible by {i})"),
                    vec![
                        format!("Check divisors of {n}"),
                        format!("Found divisor: {i}"),
                        "Therefore not prime".to_string(),
                    ],
                );
            }
            i += 1;
        }

        solution(
            json!(true),
            format!("{n} is prime"),
            vec![
                format!("Check all divisors up to √{n}"),
                "No divisors found".to_string(),
                "Therefore prime".to_string(),
            ],
        )
    }

    // === Equations ===

    /// Solves the linear equation `ax + b = 0`.
    #[must_use]
    pub fn solve_linear(self, a: f64, b: f64) -> Value {
        if a == 0.0 {
            if b == 0.0 {
                return solution(
                    json!("infinite solutions"),
                    "0x + 0 = 0 is always true".to_string(),
                    vec![
                        "The equation 0 = 0 is always true".to_string(),
                        "Therefore infinite solutions".to_string(),
                    ],
                );
            }
            return solution(
                json!("no solution"),
                format!("0x + {} = 0 is impossible", fmt(b)),
                vec![
                    format!("The equation {} = 0 is false", fmt(b)),
                    "Therefore no solution".to_string(),
                ],
            );
        }

        let result = -b / a;
        solution(
            num(result),
            format!(
                "Linear equation: {}x + {} = 0, solution: x = {}",
                fmt(a),
                fmt(b),
                fmt(result)
            ),
            vec![
                format!("{}x + {} = 0", fmt(a), fmt(b)),
                format!("{}x = {}", fmt(a), fmt(-b)),
                format!("x = {}/{} = {}", fmt(-b), fmt(a), fmt(result)),
            ],
        )
    }

    /// Solves the quadratic equation `ax² + bx + c = 0`.
    ///
    /// Degenerates to the linear solver when `a == 0`.
    #[must_use]
    pub fn solve_quadratic(self, a: f64, b: f64, c: f64) -> Value {
        if a == 0.0 {
            return self.solve_linear(b, c);
        }

        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 {
            return solution(
                json!("no real solutions"),
                format!("Discriminant = {} < 0, no real solutions", fmt(discriminant)),
                vec![
                    format!("For {}x² + {}x + {} = 0", fmt(a), fmt(b), fmt(c)),
                    format!(
                        "Discriminant = b² - 4ac = {}² - 4({})({}) = {}",
                        fmt(b),
                        fmt(a),
                        fmt(c),
                        fmt(discriminant)
                    ),
                    "Since discriminant < 0, no real solutions".to_string(),
                ],
            );
        }

        if discriminant == 0.0 {
            let x = -b / (2.0 * a);
            return solution(
                json!([num(x)]),
                format!("One solution (repeated root): x = {}", fmt(x)),
                vec![
                    format!("For {}x² + {}x + {} = 0", fmt(a), fmt(b), fmt(c)),
                    format!("Discriminant = {} = 0", fmt(discriminant)),
                    format!("x = -b/(2a) = {}/(2×{}) = {}", fmt(-b), fmt(a), fmt(x)),
                ],
            );
        }

        let sqrt_discriminant = discriminant.sqrt();
        let x1 = (-b + sqrt_discriminant) / (2.0 * a);
        let x2 = (-b - sqrt_discriminant) / (2.0 * a);
        solution(
            json!([num(x1), num(x2)]),
            format!("Two solutions: x₁ = {}, x₂ = {}", fmt(x1), fmt(x2)),
            vec![
                format!("For {}x² + {}x + {} = 0", fmt(a), fmt(b), fmt(c)),
                format!("Discriminant = {}", fmt(discriminant)),
                "x = (-b ± √discriminant)/(2a)".to_string(),
                format!(
                    "x₁ = ({} + √{})/(2×{}) = {}",
                    fmt(-b),
                    fmt(discriminant),
                    fmt(a),
                    fmt(x1)
                ),
                format!(
                    "x₂ = ({} - √{})/(2×{}) = {}",
                    fmt(-b),
                    fmt(discriminant),
                    fmt(a),
                    fmt(x2)
                ),
            ],
        )
    }

    /// Percentage of `part` in `whole`.
    #[must_use]
    pub fn percentage(self, part: f64, whole: f64) -> Value {
        if whole == 0.0 {
            return failure(
                "Cannot calculate percentage with zero as whole",
                "Division by zero in percentage calculation",
            );
        }

        let result = (part / whole) * 100.0;
        solution(
            num(result),
            format!("{} is {}% of {}", fmt(part), fmt(result), fmt(whole)),
            vec![
                "Percentage = (part/whole) × 100".to_string(),
                format!(
                    "Percentage = ({}/{}) × 100 = {}%",
                    fmt(part),
                    fmt(whole),
                    fmt(result)
                ),
            ],
        )
    }

    // === Geometry ===

    /// Area of a circle with the given radius.
    #[must_use]
    pub fn area_circle(self, radius: f64) -> Value {
        let area = std::f64::consts::PI * radius * radius;
        solution(
            num(area),
            format!("Area of circle with radius {} is {}", fmt(radius), fmt(area)),
            vec![
                "Area = π × r²".to_string(),
                format!("Area = π × {}² = {}", fmt(radius), fmt(area)),
            ],
        )
    }

    /// Area of a rectangle.
    #[must_use]
    pub fn area_rectangle(self, length: f64, width: f64) -> Value {
        let area = length * width;
        solution(
            num(area),
            format!(
                "Area of rectangle with length {} and width {} is {}",
                fmt(length),
                fmt(width),
                fmt(area)
            ),
            vec![
                "Area = length × width".to_string(),
                format!("Area = {} × {} = {}", fmt(length), fmt(width), fmt(area)),
            ],
        )
    }

    /// Area of a triangle.
    #[must_use]
    pub fn area_triangle(self, base: f64, height: f64) -> Value {
        let area = 0.5 * base * height;
        solution(
            num(area),
            format!(
                "Area of triangle with base {} and height {} is {}",
                fmt(base),
                fmt(height),
                fmt(area)
            ),
            vec![
                "Area = ½ × base × height".to_string(),
                format!("Area = ½ × {} × {} = {}", fmt(base), fmt(height), fmt(area)),
            ],
        )
    }

    /// Hypotenuse of a right triangle with legs `a` and `b`.
    #[must_use]
    pub fn pythagorean(self, a: f64, b: f64) -> Value {
        let c = a.hypot(b);
        solution(
            num(c),
            format!(
                "Hypotenuse of right triangle with legs {} and {} is {}",
                fmt(a),
                fmt(b),
                fmt(c)
            ),
            vec![
                "Pythagorean theorem: c² = a² + b²".to_string(),
                format!(
                    "c² = {}² + {}² = {} + {} = {}",
                    fmt(a),
                    fmt(b),
                    fmt(a * a),
                    fmt(b * b),
                    fmt(a * a + b * b)
                ),
                format!("c = √{} = {}", fmt(a * a + b * b), fmt(c)),
            ],
        )
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(self, x1: f64, y1: f64, x2: f64, y2: f64) -> Value {
        let distance = (x2 - x1).hypot(y2 - y1);
        solution(
            num(distance),
            format!(
                "Distance between ({}, {}) and ({}, {}) is {}",
                fmt(x1),
                fmt(y1),
                fmt(x2),
                fmt(y2),
                fmt(distance)
            ),
            vec![
                "Distance formula: d = √[(x₂-x₁)² + (y₂-y₁)²]".to_string(),
                format!(
                    "d = √[({}-{})² + ({}-{})²]",
                    fmt(x2),
                    fmt(x1),
                    fmt(y2),
                    fmt(y1)
                ),
                format!("d = √[{}² + {}²] = {}", fmt(x2 - x1), fmt(y2 - y1), fmt(distance)),
            ],
        )
    }

    /// Slope of the line through two points.
    #[must_use]
    pub fn slope(self, x1: f64, y1: f64, x2: f64, y2: f64) -> Value {
        if x2 - x1 == 0.0 {
            return solution(
                json!("undefined"),
                "Slope is undefined (vertical line)".to_string(),
                vec![
                    "x₂ - x₁ = 0".to_string(),
                    "Division by zero".to_string(),
                    "Slope is undefined".to_string(),
                ],
            );
        }

        let slope = (y2 - y1) / (x2 - x1);
        solution(
            num(slope),
            format!(
                "Slope between ({}, {}) and ({}, {}) is {}",
                fmt(x1),
                fmt(y1),
                fmt(x2),
                fmt(y2),
                fmt(slope)
            ),
            vec![
                "Slope formula: m = (y₂-y₁)/(x₂-x₁)".to_string(),
                format!(
                    "m = ({}-{})/({}-{}) = {}/{} = {}",
                    fmt(y2),
                    fmt(y1),
                    fmt(x2),
                    fmt(x1),
                    fmt(y2 - y1),
                    fmt(x2 - x1),
                    fmt(slope)
                ),
            ],
        )
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(self, x1: f64, y1: f64, x2: f64, y2: f64) -> Value {
        let mid_x = (x1 + x2) / 2.0;
        let mid_y = (y1 + y2) / 2.0;
        solution(
            json!([num(mid_x), num(mid_y)]),
            format!(
                "Midpoint between ({}, {}) and ({}, {}) is ({}, {})",
                fmt(x1),
                fmt(y1),
                fmt(x2),
                fmt(y2),
                fmt(mid_x),
                fmt(mid_y)
            ),
            vec![
                "Midpoint formula: ((x₁+x₂)/2, (y₁+y₂)/2)".to_string(),
                format!(
                    "Midpoint = (({}+{})/2, ({}+{})/2) = ({}, {})",
                    fmt(x1),
                    fmt(x2),
                    fmt(y1),
                    fmt(y2),
                    fmt(mid_x),
                    fmt(mid_y)
                ),
            ],
        )
    }

    // === Trigonometry ===

    /// Sine of an angle.
    #[must_use]
    pub fn sin(self, angle: f64, unit: AngleUnit) -> Value {
        let radians = to_radians(angle, unit);
        let result = radians.sin();
        let explanation = match unit {
            AngleUnit::Degrees => format!("sin({}°) = {}", fmt(angle), fmt(result)),
            AngleUnit::Radians => format!("sin({}) = {}", fmt(angle), fmt(result)),
        };
        solution(
            num(result),
            explanation,
            vec![
                format!("Calculate sine of {} {}", fmt(angle), unit.label()),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    /// Cosine of an angle.
    #[must_use]
    pub fn cos(self, angle: f64, unit: AngleUnit) -> Value {
        let radians = to_radians(angle, unit);
        let result = radians.cos();
        let explanation = match unit {
            AngleUnit::Degrees => format!("cos({}°) = {}", fmt(angle), fmt(result)),
            AngleUnit::Radians => format!("cos({}) = {}", fmt(angle), fmt(result)),
        };
        solution(
            num(result),
            explanation,
            vec![
                format!("Calculate cosine of {} {}", fmt(angle), unit.label()),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    /// Tangent of an angle; undefined where cosine vanishes.
    #[must_use]
    pub fn tan(self, angle: f64, unit: AngleUnit) -> Value {
        let radians = to_radians(angle, unit);

        if radians.cos().abs() < 1e-10 {
            let degree_mark = match unit {
                AngleUnit::Degrees => "°",
                AngleUnit::Radians => "",
            };
            return solution(
                json!("undefined"),
                format!(
                    "tan({}{degree_mark}) is undefined (cosine is zero)",
                    fmt(angle)
                ),
                vec![
                    format!(
                        "tan({a}{degree_mark}) = sin({a}{degree_mark})/cos({a}{degree_mark})",
                        a = fmt(angle)
                    ),
                    "cos is zero".to_string(),
                    "Therefore undefined".to_string(),
                ],
            );
        }

        let result = radians.tan();
        let explanation = match unit {
            AngleUnit::Degrees => format!("tan({}°) = {}", fmt(angle), fmt(result)),
            AngleUnit::Radians => format!("tan({}) = {}", fmt(angle), fmt(result)),
        };
        solution(
            num(result),
            explanation,
            vec![
                format!("Calculate tangent of {} {}", fmt(angle), unit.label()),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    // === Logarithms ===

    /// Logarithm of `x` to the given base (natural log when the base is e).
    #[must_use]
    pub fn log(self, x: f64, base: f64) -> Value {
        if x <= 0.0 {
            return failure(
                "Logarithm undefined for non-positive numbers",
                "Logarithm is only defined for positive real numbers",
            );
        }
        if base <= 0.0 || base == 1.0 {
            return failure(
                "Invalid logarithm base",
                "Logarithm base must be positive and not equal to 1",
            );
        }

        let (result, explanation) = if (base - std::f64::consts::E).abs() < 1e-12 {
            let result = x.ln();
            (result, format!("Natural logarithm: ln({}) = {}", fmt(x), fmt(result)))
        } else {
            let result = x.ln() / base.ln();
            (
                result,
                format!(
                    "Logarithm base {}: log_{}({}) = {}",
                    fmt(base),
                    fmt(base),
                    fmt(x),
                    fmt(result)
                ),
            )
        };

        solution(
            num(result),
            explanation,
            vec![
                format!("Calculate logarithm of {}", fmt(x)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    /// Base-10 logarithm of `x`.
    #[must_use]
    pub fn log10(self, x: f64) -> Value {
        if x <= 0.0 {
            return failure(
                "Logarithm undefined for non-positive numbers",
                "Logarithm is only defined for positive real numbers",
            );
        }

        let result = x.log10();
        solution(
            num(result),
            format!("Common logarithm: log₁₀({}) = {}", fmt(x), fmt(result)),
            vec![
                format!("Calculate log base 10 of {}", fmt(x)),
                format!("Result: {}", fmt(result)),
            ],
        )
    }

    // === Fractions ===

    /// Reduces a fraction to lowest terms.
    ///
    /// The sign is normalised onto the numerator.
    #[must_use]
    pub fn simplify_fraction(self, numerator: i64, denominator: i64) -> Value {
        if denominator == 0 {
            return failure("Denominator cannot be zero", "Division by zero is undefined");
        }

        let gcd_val = gcd(numerator.unsigned_abs(), denominator.unsigned_abs());
        let sign = if (numerator < 0) != (denominator < 0) { -1 } else { 1 };
        let (n, d) = if numerator == 0 {
            (0, 1)
        } else {
            (
                sign * (numerator.unsigned_abs() / gcd_val) as i64,
                (denominator.unsigned_abs() / gcd_val) as i64,
            )
        };

        solution(
            json!([n, d]),
            format!("Simplified fraction: {numerator}/{denominator} = {n}/{d}"),
            vec![
                format!("Original fraction: {numerator}/{denominator}"),
                format!("GCD of {numerator} and {denominator} is {gcd_val}"),
                format!("Simplified: {n}/{d}"),
            ],
        )
    }

    /// Converts a fraction to its decimal value.
    #[must_use]
    pub fn convert_to_decimal(self, numerator: i64, denominator: i64) -> Value {
        if denominator == 0 {
            return failure("Denominator cannot be zero", "Division by zero is undefined");
        }

        let decimal = numerator as f64 / denominator as f64;
        solution(
            num(decimal),
            format!("Fraction to decimal: {numerator}/{denominator} = {}", fmt(decimal)),
            vec![
                format!("Divide {numerator} by {denominator}"),
                format!("Result: {}", fmt(decimal)),
            ],
        )
    }

    /// Converts a decimal to the closest fraction with denominator ≤ 1000.
    #[must_use]
    pub fn convert_to_fraction(self, decimal: f64) -> Value {
        if !decimal.is_finite() {
            return failure(
                "Cannot convert a non-finite value to a fraction",
                "Input must be a finite decimal",
            );
        }

        let (n, d) = limit_denominator(decimal, 1000);
        solution(
            json!([n, d]),
            format!("Decimal to fraction: {} = {n}/{d}", fmt(decimal)),
            vec![
                format!("Convert {} to fraction", fmt(decimal)),
                format!("Result: {n}/{d}"),
            ],
        )
    }

    // === Expressions ===

    /// Safely evaluates an arithmetic expression.
    ///
    /// Only numbers and the operators `+ - * / ^` with parentheses are
    /// allowed, matching the tool's declared schema.
    #[must_use]
    pub fn evaluate_expression(self, expression: &str) -> Value {
        let compact: String = expression.chars().filter(|c| *c != ' ').collect();

        let allowed = |c: char| c.is_ascii_digit() || "+-*/().^".contains(c);
        if !compact.chars().all(allowed) {
            return failure(
                "Invalid characters in expression",
                "Only numbers and basic operators (+, -, *, /, ^, parentheses) are allowed",
            );
        }

        match expr::evaluate(&compact) {
            Ok(result) if result.is_finite() => solution(
                num(result),
                format!("Expression evaluation: {compact} = {}", fmt(result)),
                vec![
                    format!("Evaluate: {compact}"),
                    format!("Result: {}", fmt(result)),
                ],
            ),
            Ok(_) => failure(
                "Error evaluating expression: result is not finite",
                "Invalid mathematical expression",
            ),
            Err(e) => failure(
                format!("Error evaluating expression: {e}"),
                "Invalid mathematical expression",
            ),
        }
    }

    // === Concepts ===

    /// Explains a mathematical concept at the requested level.
    #[must_use]
    pub fn explain_concept(self, concept: &str, level: ConceptLevel) -> Value {
        let entries = concept_entries(level);
        let concept_lower = concept.to_lowercase();

        for entry in entries {
            if concept_lower.contains(entry.key) || entry.key.contains(concept_lower.as_str()) {
                return json!({
                    "concept": concept,
                    "level": level.label(),
                    "explanation": entry.explanation,
                    "example": entry.example,
                    "steps": entry.steps,
                });
            }
        }

        let available: Vec<&str> = entries.iter().map(|e| e.key).collect();
        json!({
            "concept": concept,
            "level": level.label(),
            "explanation": format!(
                "Concept '{concept}' not found in {} level explanations. Available concepts: {}",
                level.label(),
                available.join(", ")
            ),
            "example": "Please try a different concept or level.",
            "steps": [],
        })
    }
}

fn to_radians(angle: f64, unit: AngleUnit) -> f64 {
    match unit {
        AngleUnit::Radians => angle,
        AngleUnit::Degrees => angle.to_radians(),
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Renders a JSON number payload for use inside explanation strings.
fn payload_text(value: &Value) -> String {
    value.as_f64().map_or_else(|| value.to_string(), fmt)
}

/// Finds the closest fraction to `value` with denominator at most `max_den`,
/// using continued-fraction convergents and the final semiconvergent.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn limit_denominator(value: f64, max_den: i64) -> (i64, i64) {
    let sign = if value < 0.0 { -1 } else { 1 };
    let target = value.abs();

    // Convergent accumulators: h/k tracks the current convergent
    let (mut h_prev, mut k_prev) = (0i64, 1i64);
    let (mut h, mut k) = (1i64, 0i64);
    let mut x = target;
    let mut exhausted = false;

    loop {
        let a = x.floor() as i64;
        let h_next = a.saturating_mul(h).saturating_add(h_prev);
        let k_next = a.saturating_mul(k).saturating_add(k_prev);
        if k_next > max_den {
            break;
        }

        (h_prev, k_prev) = (h, k);
        (h, k) = (h_next, k_next);

        let frac = x - a as f64;
        if frac.abs() < 1e-12 {
            exhausted = true;
            break;
        }
        x = 1.0 / frac;
    }

    if exhausted || k == 0 {
        let k = k.max(1);
        return (sign * h, k);
    }

    // The best semiconvergent below the bound may beat the last convergent
    let step = (max_den - k_prev) / k;
    let h_semi = h_prev + step * h;
    let k_semi = k_prev + step * k;

    let err_conv = (target - h as f64 / k as f64).abs();
    let err_semi = (target - h_semi as f64 / k_semi as f64).abs();

    if k_semi > 0 && err_semi < err_conv {
        (sign * h_semi, k_semi)
    } else {
        (sign * h, k)
    }
}

fn concept_entries(level: ConceptLevel) -> &'static [ConceptEntry] {
    match level {
        ConceptLevel::Elementary => ELEMENTARY_CONCEPTS,
        ConceptLevel::Middle => MIDDLE_CONCEPTS,
        ConceptLevel::HighSchool => HIGH_SCHOOL_CONCEPTS,
    }
}

struct ConceptEntry {
    key: &'static str,
    explanation: &'static str,
    example: &'static str,
    steps: &'static [&'static str],
}

const ELEMENTARY_CONCEPTS: &[ConceptEntry] = &[
    ConceptEntry {
        key: "addition",
        explanation: "Addition means putting numbers together to find the total.",
        example: "If you have 3 apples and get 2 more, you add: 3 + 2 = 5 apples total.",
        steps: &[
            "Count the first group",
            "Count the second group",
            "Count them all together",
        ],
    },
    ConceptEntry {
        key: "subtraction",
        explanation: "Subtraction means taking away or finding the difference.",
        example: "If you have 8 cookies and eat 3, you subtract: 8 - 3 = 5 cookies left.",
        steps: &[
            "Start with the bigger number",
            "Take away the smaller number",
            "Count what's left",
        ],
    },
    ConceptEntry {
        key: "multiplication",
        explanation: "Multiplication is repeated addition or groups of equal size.",
        example: "3 groups of 4 objects each: 3 × 4 = 4 + 4 + 4 = 12",
        steps: &[
            "Count the number of groups",
            "Count how many in each group",
            "Add all groups together",
        ],
    },
    ConceptEntry {
        key: "division",
        explanation: "Division means sharing equally or finding how many groups.",
        example: "12 candies shared among 3 children: 12 ÷ 3 = 4 candies each",
        steps: &[
            "Start with the total",
            "Decide how many groups",
            "Share equally among groups",
        ],
    },
];

const MIDDLE_CONCEPTS: &[ConceptEntry] = &[
    ConceptEntry {
        key: "fractions",
        explanation: "Fractions represent parts of a whole, written as numerator/denominator.",
        example: "3/4 means 3 parts out of 4 equal parts total",
        steps: &[
            "Denominator shows total parts",
            "Numerator shows parts we have",
            "Can be simplified by dividing by GCD",
        ],
    },
    ConceptEntry {
        key: "decimals",
        explanation: "Decimals are another way to write fractions using place value.",
        example: "0.75 = 75/100 = 3/4",
        steps: &[
            "Each place represents a power of 10",
            "Can convert to/from fractions",
            "Useful for precise calculations",
        ],
    },
    ConceptEntry {
        key: "percentages",
        explanation: "Percentages mean 'out of 100' and show parts of a whole.",
        example: "25% = 25/100 = 0.25 = 1/4",
        steps: &[
            "Percent means per hundred",
            "Multiply by 100 to convert from decimal",
            "Divide by 100 to convert to decimal",
        ],
    },
    ConceptEntry {
        key: "algebra_basics",
        explanation: "Algebra uses letters (variables) to represent unknown numbers.",
        example: "If x + 5 = 12, then x = 7",
        steps: &[
            "Variables represent unknown values",
            "Equations show relationships",
            "Solve by isolating the variable",
        ],
    },
];

const HIGH_SCHOOL_CONCEPTS: &[ConceptEntry] = &[
    ConceptEntry {
        key: "quadratic_equations",
        explanation: "Quadratic equations have the form ax² + bx + c = 0 and can have 0, 1, or 2 real solutions.",
        example: "x² - 5x + 6 = 0 has solutions x = 2 and x = 3",
        steps: &[
            "Use quadratic formula: x = (-b ± √(b²-4ac))/(2a)",
            "Check discriminant b²-4ac",
            "If positive: 2 solutions, if zero: 1 solution, if negative: no real solutions",
        ],
    },
    ConceptEntry {
        key: "trigonometry",
        explanation: "Trigonometry studies relationships between angles and sides in triangles.",
        example: "In a right triangle, sin(θ) = opposite/hypotenuse",
        steps: &[
            "SOH: Sin = Opposite/Hypotenuse",
            "CAH: Cos = Adjacent/Hypotenuse",
            "TOA: Tan = Opposite/Adjacent",
        ],
    },
    ConceptEntry {
        key: "logarithms",
        explanation: "Logarithms are the inverse of exponential functions.",
        example: "If 2³ = 8, then log₂(8) = 3",
        steps: &[
            "log_b(x) asks 'what power gives x?'",
            "Natural log (ln) uses base e",
            "Common log uses base 10",
        ],
    },
    ConceptEntry {
        key: "functions",
        explanation: "Functions are rules that assign exactly one output to each input.",
        example: "f(x) = 2x + 1 assigns f(3) = 7",
        steps: &[
            "Domain: all possible inputs",
            "Range: all possible outputs",
            "Can be linear, quadratic, exponential, etc.",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn solver() -> MathSolver {
        MathSolver::new()
    }

    #[test]
    fn add_integers_collapse_to_json_integers() {
        let payload = solver().add(5.0, 3.0);
        assert_eq!(payload["result"], 8);
        assert_eq!(payload["explanation"], "Addition: 5 + 3 = 8");
    }

    #[test]
    fn add_keeps_fractional_results() {
        let payload = solver().add(0.5, 0.25);
        assert_eq!(payload["result"], 0.75);
    }

    #[test]
    fn divide_by_zero_reports_domain_error() {
        let payload = solver().divide(1.0, 0.0);
        assert_eq!(payload["error"], "Division by zero is undefined");
        assert!(payload.get("result").is_none());
    }

    #[test]
    fn sqrt_of_negative_reports_domain_error() {
        let payload = solver().sqrt(-4.0);
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .contains("negative number"));
    }

    #[test]
    fn factorial_small_values_exact() {
        assert_eq!(solver().factorial(0.0)["result"], 1);
        assert_eq!(solver().factorial(5.0)["result"], 120);
        assert_eq!(solver().factorial(20.0)["result"], 2_432_902_008_176_640_000i64);
    }

    #[test]
    fn factorial_rejects_invalid_input() {
        assert!(solver().factorial(-1.0).get("error").is_some());
        assert!(solver().factorial(2.5).get("error").is_some());
        assert!(solver().factorial(171.0).get("error").is_some());
    }

    #[test]
    fn gcd_and_lcm() {
        assert_eq!(solver().gcd(12, 18)["result"], 6);
        assert_eq!(solver().gcd(-12, 18)["result"], 6);
        assert_eq!(solver().lcm(4, 6)["result"], 12);
        assert_eq!(solver().lcm(0, 6)["result"], 0);
    }

    #[test]
    fn prime_factors_of_60() {
        let payload = solver().prime_factors(60);
        assert_eq!(payload["result"], serde_json::json!([2, 2, 3, 5]));
    }

    #[test]
    fn primality() {
        assert_eq!(solver().is_prime(2)["result"], true);
        assert_eq!(solver().is_prime(97)["result"], true);
        assert_eq!(solver().is_prime(1)["result"], false);
        assert_eq!(solver().is_prime(91)["result"], false);
    }

    #[test]
    fn linear_equation_cases() {
        assert_eq!(solver().solve_linear(2.0, -6.0)["result"], 3);
        assert_eq!(solver().solve_linear(0.0, 0.0)["result"], "infinite solutions");
        assert_eq!(solver().solve_linear(0.0, 5.0)["result"], "no solution");
    }

    #[test]
    fn quadratic_equation_cases() {
        // x² - 5x + 6 = 0 → x = 3, x = 2
        let payload = solver().solve_quadratic(1.0, -5.0, 6.0);
        assert_eq!(payload["result"], serde_json::json!([3, 2]));

        // x² + 2x + 1 = 0 → repeated root -1
        let payload = solver().solve_quadratic(1.0, 2.0, 1.0);
        assert_eq!(payload["result"], serde_json::json!([-1]));

        // x² + 1 = 0 → no real solutions
        let payload = solver().solve_quadratic(1.0, 0.0, 1.0);
        assert_eq!(payload["result"], "no real solutions");

        // Degenerate: a = 0 falls back to linear
        assert_eq!(solver().solve_quadratic(0.0, 2.0, -4.0)["result"], 2);
    }

    #[test]
    fn geometry_operations() {
        assert_eq!(solver().area_rectangle(4.0, 3.0)["result"], 12);
        assert_eq!(solver().area_triangle(6.0, 4.0)["result"], 12);
        assert_eq!(solver().pythagorean(3.0, 4.0)["result"], 5);
        assert_eq!(solver().distance(0.0, 0.0, 3.0, 4.0)["result"], 5);
        assert_eq!(solver().slope(0.0, 0.0, 2.0, 4.0)["result"], 2);
        assert_eq!(solver().slope(1.0, 0.0, 1.0, 5.0)["result"], "undefined");
        assert_eq!(
            solver().midpoint(0.0, 0.0, 4.0, 6.0)["result"],
            serde_json::json!([2, 3])
        );

        let circle = solver().area_circle(1.0);
        assert!((circle["result"].as_f64().unwrap() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn trigonometry_with_units() {
        let payload = solver().sin(90.0, AngleUnit::Degrees);
        assert!((payload["result"].as_f64().unwrap() - 1.0).abs() < 1e-12);

        let payload = solver().cos(0.0, AngleUnit::Radians);
        assert_eq!(payload["result"], 1);

        let payload = solver().tan(90.0, AngleUnit::Degrees);
        assert_eq!(payload["result"], "undefined");
    }

    #[test]
    fn logarithm_domain_checks() {
        assert!(solver().log(-1.0, std::f64::consts::E).get("error").is_some());
        assert!(solver().log(10.0, 1.0).get("error").is_some());
        assert!(solver().log10(0.0).get("error").is_some());

        let payload = solver().log(8.0, 2.0);
        assert!((payload["result"].as_f64().unwrap() - 3.0).abs() < 1e-12);

        assert_eq!(solver().log10(100.0)["result"], 2);
    }

    #[test]
    fn fraction_operations() {
        assert_eq!(
            solver().simplify_fraction(6, 8)["result"],
            serde_json::json!([3, 4])
        );
        assert_eq!(
            solver().simplify_fraction(6, -8)["result"],
            serde_json::json!([-3, 4])
        );
        assert!(solver().simplify_fraction(1, 0).get("error").is_some());

        assert_eq!(solver().convert_to_decimal(3, 4)["result"], 0.75);

        assert_eq!(
            solver().convert_to_fraction(0.75)["result"],
            serde_json::json!([3, 4])
        );
        assert_eq!(
            solver().convert_to_fraction(1.0 / 3.0)["result"],
            serde_json::json!([1, 3])
        );
        assert_eq!(
            solver().convert_to_fraction(-0.5)["result"],
            serde_json::json!([-1, 2])
        );
        assert_eq!(
            solver().convert_to_fraction(2.0)["result"],
            serde_json::json!([2, 1])
        );
    }

    #[test]
    fn percentage_calculation() {
        assert_eq!(solver().percentage(25.0, 50.0)["result"], 50);
        assert!(solver().percentage(1.0, 0.0).get("error").is_some());
    }

    #[test]
    fn expression_evaluation() {
        let payload = solver().evaluate_expression("2 + 3 * 4");
        assert_eq!(payload["result"], 14);

        let payload = solver().evaluate_expression("(1 + 2)^3");
        assert_eq!(payload["result"], 27);

        let payload = solver().evaluate_expression("2x + 1");
        assert_eq!(payload["error"], "Invalid characters in expression");

        let payload = solver().evaluate_expression("1 / 0");
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .contains("not finite"));
    }

    #[test]
    fn explain_known_concept() {
        let payload = solver().explain_concept("fractions", ConceptLevel::Middle);
        assert_eq!(payload["concept"], "fractions");
        assert_eq!(payload["level"], "middle");
        assert!(payload["explanation"]
            .as_str()
            .unwrap()
            .contains("parts of a whole"));
        assert_eq!(payload["steps"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn explain_concept_substring_match() {
        // "quadratic" matches the "quadratic_equations" entry
        let payload = solver().explain_concept("quadratic", ConceptLevel::HighSchool);
        assert!(payload["example"].as_str().unwrap().contains("x = 2"));
    }

    #[test]
    fn explain_unknown_concept_lists_available() {
        let payload = solver().explain_concept("topology", ConceptLevel::Elementary);
        let explanation = payload["explanation"].as_str().unwrap();
        assert!(explanation.contains("not found"));
        assert!(explanation.contains("addition"));
        assert_eq!(payload["steps"].as_array().unwrap().len(), 0);
    }
}
