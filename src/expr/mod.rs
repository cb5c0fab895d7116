//! A small arithmetic expression engine.
//!
//! Backs the `evaluate_expression` tool and the `plot_function` renderer:
//! a tokenizer, a precedence-climbing parser, and an evaluator over `f64`.
//!
//! Supported syntax:
//!
//! - numbers (`2`, `3.5`, `.25`)
//! - `+ - * /`, exponentiation as `^` or `**` (right-associative)
//! - unary minus, parentheses
//! - function calls: `sin cos tan exp log ln sqrt abs`
//! - constants: `pi`, `e`
//! - an optional free variable (`x` when plotting)
//!
//! Expressions are parsed once and may be evaluated many times with
//! different variable bindings.

use thiserror::Error;

/// Errors produced while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// A character outside the supported grammar.
    #[error("unexpected character '{0}' in expression")]
    UnexpectedChar(char),

    /// A number literal that failed to parse.
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    /// The expression ended where a value or operator was expected.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A token that does not fit the grammar at its position.
    #[error("unexpected '{0}' in expression")]
    UnexpectedToken(String),

    /// An identifier that is neither a constant nor the bound variable.
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    /// A call to a function that does not exist.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// A function called with the wrong number of arguments.
    #[error("function '{name}' expects {expected} argument(s)")]
    WrongArity {
        /// Function name.
        name: String,
        /// Number of arguments the function takes.
        expected: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Ident(s) => write!(f, "{s}"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Caret => write!(f, "^"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::Comma => write!(f, ","),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                // `**` is an alias for `^`
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Caret);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

/// A parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal.
    Number(f64),
    /// A variable or constant reference.
    Variable(String),
    /// Unary negation.
    Negate(Box<Expr>),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// A function call.
    Call {
        /// Function name.
        name: String,
        /// Call arguments.
        args: Vec<Expr>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Exponentiation.
    Pow,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ExprError> {
        match self.next() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(ExprError::UnexpectedToken(token.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_term()?;

        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinaryOp::Add),
            Some(Token::Minus) => Some(BinaryOp::Sub),
            _ => None,
        } {
            self.next();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinaryOp::Mul),
            Some(Token::Slash) => Some(BinaryOp::Div),
            _ => None,
        } {
            self.next();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        // Unary minus binds looser than `^`: -x^2 is -(x^2)
        if self.peek() == Some(&Token::Minus) {
            self.next();
            return Ok(Expr::Negate(Box::new(self.parse_unary()?)));
        }
        if self.peek() == Some(&Token::Plus) {
            self.next();
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_atom()?;

        // Right-associative: 2^3^2 is 2^(3^2); the exponent may itself be
        // signed (2^-3)
        if self.peek() == Some(&Token::Caret) {
            self.next();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }

        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, ExprError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.next();
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.peek() == Some(&Token::Comma) {
                                self.next();
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(token) => Err(ExprError::UnexpectedToken(token.to_string())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

/// Parses an expression string into an [`Expr`] tree.
///
/// # Errors
///
/// Returns an [`ExprError`] for unsupported characters or malformed syntax.
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::UnexpectedEnd);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;

    match parser.next() {
        None => Ok(expr),
        Some(trailing) => Err(ExprError::UnexpectedToken(trailing.to_string())),
    }
}

impl Expr {
    /// Evaluates the expression with an optional binding for `x`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExprError`] for unknown identifiers or functions and for
    /// arity mismatches. Domain violations (division by zero, log of a
    /// negative) follow IEEE 754 and surface as non-finite values, which the
    /// callers check for.
    pub fn eval(&self, x: Option<f64>) -> Result<f64, ExprError> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Variable(name) => match name.as_str() {
                "pi" => Ok(std::f64::consts::PI),
                "e" => Ok(std::f64::consts::E),
                "x" => x.ok_or_else(|| ExprError::UnknownIdentifier(name.clone())),
                _ => Err(ExprError::UnknownIdentifier(name.clone())),
            },
            Self::Negate(inner) => Ok(-inner.eval(x)?),
            Self::Binary { op, lhs, rhs } => {
                let lhs = lhs.eval(x)?;
                let rhs = rhs.eval(x)?;
                Ok(match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div => lhs / rhs,
                    BinaryOp::Pow => lhs.powf(rhs),
                })
            }
            Self::Call { name, args } => {
                let function: fn(f64) -> f64 = match name.as_str() {
                    "sin" => f64::sin,
                    "cos" => f64::cos,
                    "tan" => f64::tan,
                    "exp" => f64::exp,
                    "log" | "ln" => f64::ln,
                    "sqrt" => f64::sqrt,
                    "abs" => f64::abs,
                    _ => return Err(ExprError::UnknownFunction(name.clone())),
                };

                if args.len() != 1 {
                    return Err(ExprError::WrongArity {
                        name: name.clone(),
                        expected: 1,
                    });
                }

                Ok(function(args[0].eval(x)?))
            }
        }
    }
}

/// Parses and evaluates an expression in one step, with no variable bound.
///
/// # Errors
///
/// Returns an [`ExprError`] for malformed syntax or unknown identifiers.
pub fn evaluate(input: &str) -> Result<f64, ExprError> {
    parse(input)?.eval(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(input: &str) -> f64 {
        evaluate(input).unwrap()
    }

    #[test]
    fn evaluates_basic_arithmetic() {
        assert!((eval("2 + 3") - 5.0).abs() < 1e-12);
        assert!((eval("10 - 4") - 6.0).abs() < 1e-12);
        assert!((eval("6 * 7") - 42.0).abs() < 1e-12);
        assert!((eval("15 / 4") - 3.75).abs() < 1e-12);
    }

    #[test]
    fn respects_precedence() {
        assert!((eval("2 + 3 * 4") - 14.0).abs() < 1e-12);
        assert!((eval("(2 + 3) * 4") - 20.0).abs() < 1e-12);
        assert!((eval("20 - 6 / 2") - 17.0).abs() < 1e-12);
    }

    #[test]
    fn exponentiation_is_right_associative() {
        assert!((eval("2^3") - 8.0).abs() < 1e-12);
        assert!((eval("2**3") - 8.0).abs() < 1e-12);
        assert!((eval("2^3^2") - 512.0).abs() < 1e-12);
        assert!((eval("2^-1") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        assert!((eval("-2^2") - -4.0).abs() < 1e-12);
        assert!((eval("(-2)^2") - 4.0).abs() < 1e-12);
        assert!((eval("--3") - 3.0).abs() < 1e-12);
    }

    #[test]
    fn constants_and_functions() {
        assert!((eval("pi") - std::f64::consts::PI).abs() < 1e-12);
        assert!((eval("sin(0)")).abs() < 1e-12);
        assert!((eval("cos(0)") - 1.0).abs() < 1e-12);
        assert!((eval("sqrt(16)") - 4.0).abs() < 1e-12);
        assert!((eval("abs(-3.5)") - 3.5).abs() < 1e-12);
        assert!((eval("log(e)") - 1.0).abs() < 1e-12);
        assert!((eval("exp(0)") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn variable_binding() {
        let expr = parse("x^2 - 4*x + 3").unwrap();
        assert!((expr.eval(Some(1.0)).unwrap()).abs() < 1e-12);
        assert!((expr.eval(Some(3.0)).unwrap()).abs() < 1e-12);
        assert!((expr.eval(Some(0.0)).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn unbound_variable_is_an_error() {
        let expr = parse("x + 1").unwrap();
        assert_eq!(
            expr.eval(None),
            Err(ExprError::UnknownIdentifier("x".to_string()))
        );
    }

    #[test]
    fn unknown_identifier_and_function() {
        assert_eq!(
            evaluate("y + 1"),
            Err(ExprError::UnknownIdentifier("y".to_string()))
        );
        assert_eq!(
            evaluate("foo(1)"),
            Err(ExprError::UnknownFunction("foo".to_string()))
        );
        assert_eq!(
            evaluate("sin(1, 2)"),
            Err(ExprError::WrongArity {
                name: "sin".to_string(),
                expected: 1
            })
        );
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(evaluate(""), Err(ExprError::UnexpectedEnd)));
        assert!(matches!(evaluate("2 +"), Err(ExprError::UnexpectedEnd)));
        assert!(matches!(evaluate("(2 + 3"), Err(ExprError::UnexpectedEnd)));
        assert!(matches!(
            evaluate("2 3"),
            Err(ExprError::UnexpectedToken(_))
        ));
        assert!(matches!(
            evaluate("2 @ 3"),
            Err(ExprError::UnexpectedChar('@'))
        ));
        assert!(matches!(
            evaluate("1.2.3"),
            Err(ExprError::InvalidNumber(_))
        ));
    }

    #[test]
    fn division_by_zero_is_non_finite() {
        assert!(eval("1 / 0").is_infinite());
        assert!(eval("0 / 0").is_nan());
    }
}
