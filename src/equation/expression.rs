use serde::{Deserialize, Serialize};

use std::fmt;

use operator::Operator;

use super::{
    NumericConstant,
    evaluator::{EvaluationError, Scope},
    parse::parse_expression,
};

/// Arithmetic expression tree for the right-hand side of an equation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(NumericConstant),
    Variable(String),
    Parentheses(Box<Expression>),
    Exponentiation(Box<Expression>, Box<Expression>),
    UnaryPlus(Box<Expression>),
    UnaryMinus(Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Modulo(Box<Expression>, Box<Expression>),
    Add(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    FunctionCall {
        name: String,
        parameters: Vec<Expression>,
    },
}

impl Expression {
    pub fn constant(value: f64) -> Self {
        Expression::Constant(NumericConstant(value))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn parentheses(expr: Expression) -> Self {
        Expression::Parentheses(Box::new(expr))
    }

    pub fn exponentiation(base: Expression, exponent: Expression) -> Self {
        Expression::Exponentiation(Box::new(base), Box::new(exponent))
    }

    pub fn unary_plus(expr: Expression) -> Self {
        Expression::UnaryPlus(Box::new(expr))
    }

    pub fn unary_minus(expr: Expression) -> Self {
        Expression::UnaryMinus(Box::new(expr))
    }

    pub fn multiply(lhs: Expression, rhs: Expression) -> Self {
        Expression::Multiply(Box::new(lhs), Box::new(rhs))
    }

    pub fn divide(lhs: Expression, rhs: Expression) -> Self {
        Expression::Divide(Box::new(lhs), Box::new(rhs))
    }

    pub fn modulo(lhs: Expression, rhs: Expression) -> Self {
        Expression::Modulo(Box::new(lhs), Box::new(rhs))
    }

    pub fn add(lhs: Expression, rhs: Expression) -> Self {
        Expression::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn subtract(lhs: Expression, rhs: Expression) -> Self {
        Expression::Subtract(Box::new(lhs), Box::new(rhs))
    }

    pub fn function_call(name: impl Into<String>, parameters: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            parameters,
        }
    }

    pub fn top_operator(&self) -> Option<Operator> {
        match self {
            Expression::Parentheses(_) => Some(Operator::Paren),
            Expression::Exponentiation(_, _) => Some(Operator::Exponentiation),
            Expression::UnaryPlus(_) => Some(Operator::UnaryPlus),
            Expression::UnaryMinus(_) => Some(Operator::UnaryMinus),
            Expression::Multiply(_, _) => Some(Operator::Multiply),
            Expression::Divide(_, _) => Some(Operator::Divide),
            Expression::Modulo(_, _) => Some(Operator::Modulo),
            Expression::Add(_, _) => Some(Operator::Add),
            Expression::Subtract(_, _) => Some(Operator::Subtract),
            Expression::Constant(_) => None,
            Expression::Variable(_) => None,
            Expression::FunctionCall { .. } => None,
        }
    }

    /// Evaluates the expression against `scope`.
    ///
    /// Names are looked up in the scope first; `pi` and `e` fall back to
    /// their mathematical values when the scope does not bind them.
    pub fn evaluate(&self, scope: &Scope) -> Result<f64, EvaluationError> {
        match self {
            Expression::Constant(value) => Ok(value.0),
            Expression::Variable(name) => match scope.get(name) {
                Some(value) => Ok(*value),
                None => function::builtin_constant(name)
                    .ok_or_else(|| EvaluationError::UnknownVariable(name.clone())),
            },
            Expression::Parentheses(inner) | Expression::UnaryPlus(inner) => inner.evaluate(scope),
            Expression::UnaryMinus(inner) => Ok(-inner.evaluate(scope)?),
            Expression::Exponentiation(base, exponent) => {
                Ok(base.evaluate(scope)?.powf(exponent.evaluate(scope)?))
            }
            Expression::Multiply(lhs, rhs) => Ok(lhs.evaluate(scope)? * rhs.evaluate(scope)?),
            Expression::Divide(lhs, rhs) => Ok(lhs.evaluate(scope)? / rhs.evaluate(scope)?),
            Expression::Modulo(lhs, rhs) => {
                let dividend = lhs.evaluate(scope)?;
                let divisor = rhs.evaluate(scope)?;
                Ok(dividend - divisor * (dividend / divisor).floor())
            }
            Expression::Add(lhs, rhs) => Ok(lhs.evaluate(scope)? + rhs.evaluate(scope)?),
            Expression::Subtract(lhs, rhs) => Ok(lhs.evaluate(scope)? - rhs.evaluate(scope)?),
            Expression::FunctionCall { name, parameters } => {
                let args = parameters
                    .iter()
                    .map(|p| p.evaluate(scope))
                    .collect::<Result<Vec<_>, _>>()?;
                function::call(name, &args)
            }
        }
    }
}

/// Operands of `parent` get parentheses when they bind looser than it, or
/// equally loosely on the side its associativity does not absorb.
struct Operand<'a> {
    expr: &'a Expression,
    wrap: bool,
}

impl<'a> Operand<'a> {
    fn left(parent: Operator, expr: &'a Expression) -> Self {
        let wrap = expr.binding().is_some_and(|p| match parent {
            Operator::Exponentiation => p >= parent.precedence(),
            _ => p > parent.precedence(),
        });
        Operand { expr, wrap }
    }

    fn right(parent: Operator, expr: &'a Expression) -> Self {
        let wrap = expr.binding().is_some_and(|p| match parent {
            Operator::Exponentiation | Operator::UnaryPlus | Operator::UnaryMinus => {
                p > Operator::UnaryMinus.precedence()
            }
            _ => p >= parent.precedence(),
        });
        Operand { expr, wrap }
    }
}

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wrap {
            write!(f, "({})", self.expr)
        } else {
            write!(f, "{}", self.expr)
        }
    }
}

impl Expression {
    /// Precedence of the outermost operator as written out; negative
    /// constants print with a leading minus and bind like unary minus.
    fn binding(&self) -> Option<u8> {
        match self {
            Expression::Constant(NumericConstant(v)) if v.is_sign_negative() => {
                Some(Operator::UnaryMinus.precedence())
            }
            _ => self.top_operator().map(|op| op.precedence()),
        }
    }
}

fn binary(f: &mut fmt::Formatter<'_>, op: Operator, lhs: &Expression, rhs: &Expression) -> fmt::Result {
    write!(f, "{} {} {}", Operand::left(op, lhs), op, Operand::right(op, rhs))
}

/// Writes the expression back out in the syntax the parser reads,
/// parenthesizing only where precedence requires it.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write!(f, "{}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Parentheses(expr) => write!(f, "({})", expr),
            Expression::UnaryPlus(expr) => write!(f, "+{}", Operand::right(Operator::UnaryPlus, expr)),
            Expression::UnaryMinus(expr) => write!(f, "-{}", Operand::right(Operator::UnaryMinus, expr)),
            Expression::Exponentiation(lhs, rhs) => binary(f, Operator::Exponentiation, lhs, rhs),
            Expression::Multiply(lhs, rhs) => binary(f, Operator::Multiply, lhs, rhs),
            Expression::Divide(lhs, rhs) => binary(f, Operator::Divide, lhs, rhs),
            Expression::Modulo(lhs, rhs) => binary(f, Operator::Modulo, lhs, rhs),
            Expression::Add(lhs, rhs) => binary(f, Operator::Add, lhs, rhs),
            Expression::Subtract(lhs, rhs) => binary(f, Operator::Subtract, lhs, rhs),
            Expression::FunctionCall { name, parameters } => {
                write!(f, "{}(", name)?;
                for (i, param) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        parse_expression(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Expression {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub mod operator {
    //! ### Operators
    //!
    //! Supported operators in precedence order, tightest first. All binary
    //! operators but exponentiation associate left to right.
    //!
    //! | Operators | Precedence Group                 |
    //! |:---------:|:---------------------------------|
    //! | ( )       | Parentheses, function calls      |
    //! | **        | Exponentiation                   |
    //! | + -       | Unary operators                  |
    //! | * / %     | Multiplication, division, modulo |
    //! | + -       | Addition, subtraction            |
    //!
    //! Unary minus binds looser than exponentiation, so `-2 ** 2` is `-4`
    //! and `2 ** -1` is `0.5`. Modulo is the floored modulus: the sign of
    //! the result follows the divisor.

    use std::fmt;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub enum Operator {
        Paren,
        Exponentiation,
        UnaryPlus,
        UnaryMinus,
        Multiply,
        Divide,
        Modulo,
        Add,
        Subtract,
    }

    impl Operator {
        pub fn precedence(&self) -> u8 {
            match self {
                Operator::Paren => 0,
                Operator::Exponentiation => 1,
                Operator::UnaryPlus | Operator::UnaryMinus => 2,
                Operator::Multiply | Operator::Divide | Operator::Modulo => 3,
                Operator::Add | Operator::Subtract => 4,
            }
        }
    }

    impl fmt::Display for Operator {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let symbol = match self {
                Operator::Paren => "()",
                Operator::Exponentiation => "**",
                Operator::UnaryPlus => "+",
                Operator::UnaryMinus => "-",
                Operator::Multiply => "*",
                Operator::Divide => "/",
                Operator::Modulo => "%",
                Operator::Add => "+",
                Operator::Subtract => "-",
            };
            write!(f, "{}", symbol)
        }
    }
}

pub mod function {
    //! ### Built-in Functions
    //!
    //! Function names are matched case-insensitively. Every function takes
    //! a fixed number of arguments except `min` and `max`, which take one
    //! or more.

    use std::f64::consts;

    use crate::equation::evaluator::EvaluationError;

    /// Values for names that are not bound in the scope.
    pub fn builtin_constant(name: &str) -> Option<f64> {
        match name {
            "pi" | "PI" => Some(consts::PI),
            "e" | "E" => Some(consts::E),
            _ => None,
        }
    }

    fn expect_arity(name: &str, args: &[f64], expected: usize) -> Result<(), EvaluationError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(EvaluationError::Arity {
                function: name.to_string(),
                expected: expected.to_string(),
                found: args.len(),
            })
        }
    }

    pub fn call(name: &str, args: &[f64]) -> Result<f64, EvaluationError> {
        let lowered = name.to_ascii_lowercase();
        let unary: Option<fn(f64) -> f64> = match lowered.as_str() {
            "sin" => Some(f64::sin),
            "cos" => Some(f64::cos),
            "tan" => Some(f64::tan),
            "asin" => Some(f64::asin),
            "acos" => Some(f64::acos),
            "atan" => Some(f64::atan),
            "sinh" => Some(f64::sinh),
            "cosh" => Some(f64::cosh),
            "tanh" => Some(f64::tanh),
            "sqrt" => Some(f64::sqrt),
            "exp" => Some(f64::exp),
            "ln" | "log" => Some(f64::ln),
            "log10" => Some(f64::log10),
            "log2" => Some(f64::log2),
            "abs" => Some(f64::abs),
            "floor" => Some(f64::floor),
            "ceil" => Some(f64::ceil),
            "round" => Some(f64::round),
            _ => None,
        };

        if let Some(f) = unary {
            expect_arity(name, args, 1)?;
            return Ok(f(args[0]));
        }

        match lowered.as_str() {
            "pow" => {
                expect_arity(name, args, 2)?;
                Ok(args[0].powf(args[1]))
            }
            "atan2" => {
                expect_arity(name, args, 2)?;
                Ok(args[0].atan2(args[1]))
            }
            "min" | "max" => {
                if args.is_empty() {
                    return Err(EvaluationError::Arity {
                        function: name.to_string(),
                        expected: "at least 1".to_string(),
                        found: 0,
                    });
                }
                let fold: fn(f64, f64) -> f64 = if lowered == "min" { f64::min } else { f64::max };
                Ok(args.iter().copied().fold(args[0], fold))
            }
            _ => Err(EvaluationError::UnknownFunction(name.to_string())),
        }
    }
}
