//! # Expression Evaluation Capability
//!
//! The solver never evaluates arithmetic itself: it hands the right-hand
//! side of an equation and a [`Scope`] to an [`ExpressionEvaluator`]. The
//! crate ships [`NativeEvaluator`], backed by the grammar in
//! [`parse`](crate::equation::parse); callers with their own math engine
//! implement the trait instead.
//!
//! ```rust
//! use equationer::equation::evaluator::{ExpressionEvaluator, NativeEvaluator, Scope};
//!
//! let mut scope = Scope::new();
//! scope.insert("T".to_string(), 300.0);
//!
//! let value = NativeEvaluator.evaluate("T ** 2 / 3", &scope).unwrap();
//! assert_eq!(value, 30000.0);
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

use super::parse::parse_expression;

/// Name to value bindings an expression is evaluated against.
pub type Scope = BTreeMap<String, f64>;

/// Errors raised while solving an equation or evaluating an expression.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    /// The equation string has no `=`.
    #[error("Equation '{0}' has no '=' separating the dependent variable from the expression")]
    MissingEquals(String),

    /// The left-hand side is not the bare dependent variable.
    #[error(
        "Unsupported equation form in '{equation}': dependent variable '{dependent}' is not properly isolated on the left-hand side (found '{lhs}')"
    )]
    UnsupportedEquationForm {
        equation: String,
        lhs: String,
        dependent: String,
    },

    /// The expression text could not be parsed.
    #[error("Could not parse expression '{expression}': {message}")]
    Parse { expression: String, message: String },

    /// A name was neither in scope nor a built-in constant.
    #[error("Undefined symbol '{0}'")]
    UnknownVariable(String),

    /// A call named a function the evaluator does not provide.
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    /// A built-in function was called with the wrong number of arguments.
    #[error("Function '{function}' expects {expected} argument(s), found {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    /// Evaluation produced infinity or NaN.
    #[error("Expression '{expression}' evaluated to a non-finite value ({value})")]
    NonFiniteResult { expression: String, value: f64 },
}

impl EvaluationError {
    /// True for errors caused by the shape of the equation rather than by
    /// the numbers fed into it.
    pub fn is_form_error(&self) -> bool {
        matches!(
            self,
            EvaluationError::MissingEquals(_) | EvaluationError::UnsupportedEquationForm { .. }
        )
    }
}

/// An external math-expression evaluator.
///
/// Implementations receive expressions already normalized to `**`
/// exponentiation and must fail rather than return non-finite values.
pub trait ExpressionEvaluator {
    fn evaluate(&self, expression: &str, scope: &Scope) -> Result<f64, EvaluationError>;
}

/// The evaluator built on this crate's own expression grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEvaluator;

impl ExpressionEvaluator for NativeEvaluator {
    fn evaluate(&self, expression: &str, scope: &Scope) -> Result<f64, EvaluationError> {
        let value = parse_expression(expression)?.evaluate(scope)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvaluationError::NonFiniteResult {
                expression: expression.to_string(),
                value,
            })
        }
    }
}

/// Rewrites caret exponentiation (`a^b`) to the `a**b` form evaluators and
/// unit backends expect.
pub fn normalize_exponents(input: &str) -> String {
    input.replace('^', "**")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_exponents() {
        assert_eq!(normalize_exponents("e^((-Ea)/(R*T))"), "e**((-Ea)/(R*T))");
        assert_eq!(normalize_exponents("m/s**2"), "m/s**2");
    }

    #[test]
    fn test_non_finite_is_error() {
        let err = NativeEvaluator.evaluate("1 / 0", &Scope::new()).unwrap_err();
        assert!(matches!(err, EvaluationError::NonFiniteResult { .. }));

        let err = NativeEvaluator.evaluate("sqrt(-1)", &Scope::new()).unwrap_err();
        assert!(matches!(err, EvaluationError::NonFiniteResult { .. }));
    }

    #[test]
    fn test_form_errors() {
        assert!(EvaluationError::MissingEquals("x".into()).is_form_error());
        assert!(!EvaluationError::UnknownVariable("x".into()).is_form_error());
    }
}
