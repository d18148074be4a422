//! # Equation Solver
//!
//! Evaluates equations of the form `"<dependent> = <expression>"`. Despite
//! the name nothing is rearranged symbolically: the dependent variable must
//! already stand alone on the left-hand side, and the right-hand side is
//! evaluated for each sample of the independent variable(s).
//!
//! ```rust
//! use equationer::equation::evaluator::{NativeEvaluator, Scope};
//! use equationer::equation::solver::EquationSolver;
//!
//! let mut constants = Scope::new();
//! constants.insert("a".to_string(), 2.0);
//!
//! let solver = EquationSolver::new(&NativeEvaluator, "y = a * x^2", "y", constants).unwrap();
//! assert_eq!(solver.solve(&[("x", 3.0)]).unwrap(), 18.0);
//!
//! // The left side must be the bare dependent variable.
//! assert!(EquationSolver::new(&NativeEvaluator, "2*y = x", "y", Scope::new()).is_err());
//! ```

use std::fmt;

use log::{debug, warn};

use super::evaluator::{EvaluationError, ExpressionEvaluator, NativeEvaluator, Scope, normalize_exponents};
use crate::types::WithWarnings;

/// One sample whose evaluation failed, with the bindings that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFailure {
    pub sample: Vec<(String, f64)>,
    pub error: EvaluationError,
}

impl fmt::Display for SampleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self
            .sample
            .iter()
            .map(|(name, value)| format!("{} = {}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "at {}: {}", bindings, self.error)
    }
}

/// Flattened results of a two-variable sweep.
///
/// Entry `i` of each vector belongs to the same `(x, y)` pair; pairs are
/// ordered with x as the outer loop and y as the inner loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSamples {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<Option<f64>>,
}

/// Evaluates one equation for many samples.
pub struct EquationSolver<'e, E: ExpressionEvaluator + ?Sized> {
    evaluator: &'e E,
    expression: String,
    dependent: String,
    constants: Scope,
}

impl<'e, E: ExpressionEvaluator + ?Sized> EquationSolver<'e, E> {
    /// Prepares `equation` for evaluation.
    ///
    /// Caret exponentiation is rewritten to `**`, the equation is split at
    /// the first `=`, and the trimmed left side must equal `dependent`.
    pub fn new(
        evaluator: &'e E,
        equation: &str,
        dependent: &str,
        constants: Scope,
    ) -> Result<Self, EvaluationError> {
        let normalized = normalize_exponents(equation);
        let (lhs, rhs) = normalized
            .split_once('=')
            .ok_or_else(|| EvaluationError::MissingEquals(equation.to_string()))?;

        let lhs = lhs.trim();
        if lhs != dependent {
            return Err(EvaluationError::UnsupportedEquationForm {
                equation: equation.to_string(),
                lhs: lhs.to_string(),
                dependent: dependent.to_string(),
            });
        }

        Ok(Self {
            evaluator,
            expression: rhs.trim().to_string(),
            dependent: dependent.to_string(),
            constants,
        })
    }

    pub fn dependent(&self) -> &str {
        &self.dependent
    }

    /// The normalized right-hand side.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluates the right-hand side with the constants overridden or
    /// extended by `sample`.
    pub fn solve(&self, sample: &[(&str, f64)]) -> Result<f64, EvaluationError> {
        let mut scope = self.constants.clone();
        for (name, value) in sample {
            scope.insert((*name).to_string(), *value);
        }
        self.evaluator.evaluate(&self.expression, &scope)
    }

    fn solve_or_record(
        &self,
        sample: &[(&str, f64)],
        failures: &mut Vec<SampleFailure>,
    ) -> Option<f64> {
        match self.solve(sample) {
            Ok(value) => Some(value),
            Err(error) => {
                let failure = SampleFailure {
                    sample: sample.iter().map(|(n, v)| ((*n).to_string(), *v)).collect(),
                    error,
                };
                warn!("Equation solving error for '{}' {}", self.dependent, failure);
                failures.push(failure);
                None
            }
        }
    }

    /// Solves once per value of `variable`.
    ///
    /// Failed samples become `None` so the output stays aligned with
    /// `values`; the failures are returned as warnings.
    pub fn solve_series(
        &self,
        variable: &str,
        values: &[f64],
    ) -> WithWarnings<Vec<Option<f64>>, SampleFailure> {
        let mut failures = Vec::new();
        let results = values
            .iter()
            .map(|&value| self.solve_or_record(&[(variable, value)], &mut failures))
            .collect::<Vec<_>>();

        debug!(
            "Solved '{}' over {} samples of '{}' ({} failed)",
            self.dependent,
            values.len(),
            variable,
            failures.len()
        );
        WithWarnings::from_parts(results, failures)
    }

    /// Solves once per pair in the cross product of `x_values` and
    /// `y_values`, x outer and y inner.
    pub fn solve_grid(
        &self,
        x_variable: &str,
        x_values: &[f64],
        y_variable: &str,
        y_values: &[f64],
    ) -> WithWarnings<GridSamples, SampleFailure> {
        let mut failures = Vec::new();
        let mut grid = GridSamples::default();

        for &x in x_values {
            for &y in y_values {
                let z = self.solve_or_record(&[(x_variable, x), (y_variable, y)], &mut failures);
                grid.x.push(x);
                grid.y.push(y);
                grid.z.push(z);
            }
        }

        debug!(
            "Solved '{}' over a {}x{} grid ({} failed)",
            self.dependent,
            x_values.len(),
            y_values.len(),
            failures.len()
        );
        WithWarnings::from_parts(grid, failures)
    }
}

/// Evaluates `equation` once with the native evaluator.
pub fn solve_equation(equation: &str, scope: &Scope, dependent: &str) -> Result<f64, EvaluationError> {
    EquationSolver::new(&NativeEvaluator, equation, dependent, scope.clone())?.solve(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrhenius_constants() -> Scope {
        [("A", 1e13), ("Ea", 40000.0), ("R", 8.314), ("e", 2.71828)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_arrhenius_at_300k() {
        let solver = EquationSolver::new(
            &NativeEvaluator,
            "k = A * e^((-Ea)/(R*T))",
            "k",
            arrhenius_constants(),
        )
        .unwrap();

        let k = solver.solve(&[("T", 300.0)]).unwrap();
        let expected = 1e13 * 2.71828f64.powf(-40000.0 / (8.314 * 300.0));
        assert!((k - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_rejects_non_isolated_dependent() {
        let err = EquationSolver::new(&NativeEvaluator, "2*k = A*T", "k", Scope::new())
            .err()
            .unwrap();
        assert!(err.is_form_error());
        assert!(matches!(err, EvaluationError::UnsupportedEquationForm { .. }));
    }

    #[test]
    fn test_missing_equals() {
        let err = EquationSolver::new(&NativeEvaluator, "A*T", "k", Scope::new())
            .err()
            .unwrap();
        assert_eq!(err, EvaluationError::MissingEquals("A*T".to_string()));
    }

    #[test]
    fn test_sample_overrides_constant() {
        let constants: Scope = [("T".to_string(), 1.0)].into_iter().collect();
        let solver = EquationSolver::new(&NativeEvaluator, "y = T", "y", constants).unwrap();
        assert_eq!(solver.solve(&[("T", 5.0)]).unwrap(), 5.0);
        assert_eq!(solver.solve(&[]).unwrap(), 1.0);
    }

    #[test]
    fn test_series_records_failures_as_gaps() {
        let solver = EquationSolver::new(&NativeEvaluator, "y = 1 / x", "y", Scope::new()).unwrap();
        let result = solver.solve_series("x", &[-1.0, 0.0, 2.0]);

        let (values, failures) = result.into_parts();
        assert_eq!(values, vec![Some(-1.0), None, Some(0.5)]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].sample, vec![("x".to_string(), 0.0)]);
    }

    #[test]
    fn test_grid_order_is_x_outer() {
        let solver = EquationSolver::new(&NativeEvaluator, "z = x * 10 + y", "z", Scope::new()).unwrap();
        let grid = solver.solve_grid("x", &[1.0, 2.0], "y", &[3.0, 4.0]).into_value();

        assert_eq!(grid.x, vec![1.0, 1.0, 2.0, 2.0]);
        assert_eq!(grid.y, vec![3.0, 4.0, 3.0, 4.0]);
        assert_eq!(grid.z, vec![Some(13.0), Some(14.0), Some(23.0), Some(24.0)]);
    }

    #[test]
    fn test_solve_equation_helper() {
        let scope: Scope = [("T".to_string(), 2.0)].into_iter().collect();
        assert_eq!(solve_equation("y = T^3", &scope, "y").unwrap(), 8.0);
    }
}
