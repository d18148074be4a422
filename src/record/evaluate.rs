use log::{debug, info};

use super::{EquationOutput, EquationRecord, constants_scope, split_label_units};
use crate::{
    equation::{EquationSolver, ExpressionEvaluator, NativeEvaluator, SampleFailure},
    errors::{Error, ValidationError},
    types::WithWarnings,
};

/// Name and unit text of a labelled variable.
struct Variable {
    name: String,
    units: String,
}

impl Variable {
    fn from_label(field: &str, label: Option<&str>) -> Result<Self, ValidationError> {
        let (name, units) = split_label_units(label.unwrap_or_default());
        if name.is_empty() {
            return Err(ValidationError::MissingVariable(field.to_string()));
        }
        Ok(Self { name, units })
    }
}

impl EquationRecord {
    /// Evaluates the equation with the built-in expression evaluator.
    pub fn evaluate(&mut self) -> Result<WithWarnings<EquationOutput, SampleFailure>, Error> {
        self.evaluate_with(&NativeEvaluator)
    }

    /// Samples the independent variables, solves the equation once per
    /// sample and stores the units and points on the record.
    ///
    /// Configuration problems and an equation whose left side is not the
    /// bare dependent variable are errors. Samples the evaluator rejects
    /// become `None` in the dependent points and are returned as warnings.
    /// Re-evaluating recomputes every output field from the inputs. The
    /// previous outputs are cleared first, so a failed evaluation leaves no
    /// stale points behind.
    pub fn evaluate_with<E>(&mut self, evaluator: &E) -> Result<WithWarnings<EquationOutput, SampleFailure>, Error>
    where
        E: ExpressionEvaluator + ?Sized,
    {
        self.clear_output();

        if let Some(d) = self.graphical_dimensionality.filter(|d| !matches!(d, 2 | 3)) {
            return Err(ValidationError::InvalidDimensionality(d).into());
        }

        let x = Variable::from_label("x_variable", Some(self.x_variable.as_str()))?;
        let scope = constants_scope(&self.constants)?;
        let x_values = self
            .sampler("x", Some(self.x_range_default), self.x_range_limits, &self.x_points_specified)?
            .sample()?;

        let failures = if self.is_three_dimensional() {
            let y = Variable::from_label("y_variable", Some(self.y_variable.as_str()))?;
            let z = Variable::from_label("z_variable", self.z_variable.as_deref())?;
            let y_values = self
                .sampler(
                    "y",
                    self.y_range_default,
                    self.y_range_limits.unwrap_or_default(),
                    &self.y_points_specified,
                )?
                .sample()?;

            let solver = EquationSolver::new(evaluator, &self.equation_string, &z.name, scope)?;
            let (grid, failures) = solver.solve_grid(&x.name, &x_values, &y.name, &y_values).into_parts();

            self.x_points = Some(grid.x);
            self.y_points = Some(grid.y.into_iter().map(Some).collect());
            self.z_points = Some(grid.z);
            self.x_units = Some(x.units);
            self.y_units = Some(y.units);
            self.z_units = Some(z.units);
            failures
        } else {
            let y = Variable::from_label("y_variable", Some(self.y_variable.as_str()))?;

            let solver = EquationSolver::new(evaluator, &self.equation_string, &y.name, scope)?;
            let (y_values, failures) = solver.solve_series(&x.name, &x_values).into_parts();

            self.x_points = Some(x_values);
            self.y_points = Some(y_values);
            self.z_points = None;
            self.x_units = Some(x.units);
            self.y_units = Some(y.units);
            self.z_units = None;
            failures
        };

        if failures.is_empty() {
            info!("Evaluated '{}'", self.equation_string);
        } else {
            debug!(
                "Evaluated '{}' with {} failed samples",
                self.equation_string,
                failures.len()
            );
        }

        Ok(WithWarnings::from_parts(self.output(), failures))
    }

    fn clear_output(&mut self) {
        self.x_units = None;
        self.y_units = None;
        self.z_units = None;
        self.x_points = None;
        self.y_points = None;
        self.z_points = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation::EvaluationError;
    use pretty_assertions::assert_eq;

    fn arrhenius() -> EquationRecord {
        let mut record = EquationRecord::new();
        record.set_equation("k = A * e^((-Ea)/(R*T))");
        record.set_x_variable("T (K)");
        record.set_y_variable("k (s**-1)");
        record
            .add_constants([
                ("A", "1e13"),
                ("Ea", "40000 J/mol"),
                ("R", "8.314 J/(mol*K)"),
                ("e", "2.71828"),
            ])
            .unwrap();
        record
    }

    #[test]
    fn test_arrhenius_single_point() {
        let mut record = arrhenius();
        record.set_x_points_specified(&[300.0]).unwrap();

        let output = record.evaluate().unwrap();
        assert!(output.is_ok());

        let k = output.value().y_points.as_ref().unwrap()[0].unwrap();
        let expected = 1e13 * 2.71828f64.powf(-40000.0 / (8.314 * 300.0));
        assert!((k - expected).abs() / expected < 1e-12);
        assert_eq!(record.x_units(), Some("K"));
    }

    #[test]
    fn test_rejects_unsupported_form() {
        let mut record = arrhenius();
        record.set_equation("2*k = A*T");
        record.set_num_of_points(3).unwrap();

        let err = record.evaluate().unwrap_err();
        assert!(matches!(
            err,
            Error::Evaluation(EvaluationError::UnsupportedEquationForm { .. })
        ));
    }

    #[test]
    fn test_requires_point_count() {
        let mut record = arrhenius();
        let err = record.evaluate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingVariable(ref field)) if field == "num_of_points"
        ));
    }

    #[test]
    fn test_limits_reject_samples() {
        let mut record = arrhenius();
        record.set_x_range_default(&[200.0, 700.0]).unwrap();
        record.set_x_range_limits(&[None, Some(600.0)]).unwrap();
        record.set_num_of_points(6).unwrap();

        let err = record.evaluate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::OutOfLimits { .. })
        ));
        assert_eq!(record.x_points(), None);
    }

    #[test]
    fn test_failed_reevaluation_clears_outputs() {
        let mut record = arrhenius();
        record.set_x_range_default(&[300.0, 500.0]).unwrap();
        record.set_num_of_points(3).unwrap();
        record.evaluate().unwrap();
        assert_eq!(record.x_points(), Some(&[300.0, 400.0, 500.0][..]));

        record.set_x_range_limits(&[None, Some(450.0)]).unwrap();
        assert!(record.evaluate().is_err());

        assert_eq!(record.output(), EquationOutput::default());
        let value = record.to_value().unwrap();
        assert!(value.get("x_points").is_none_or(|v| v.is_null()));
    }

    #[test]
    fn test_failed_samples_are_gaps() {
        let mut record = EquationRecord::new();
        record.set_equation("y = 1 / x");
        record.set_x_variable("x");
        record.set_y_variable("y");
        record.set_x_points_specified(&[-1.0, 0.0, 4.0]).unwrap();

        let (output, failures) = record.evaluate().unwrap().into_parts();
        assert_eq!(output.y_points, Some(vec![Some(-1.0), None, Some(0.25)]));
        assert_eq!(failures.len(), 1);
        assert_eq!(output.x_units.as_deref(), Some(""));
    }

    #[test]
    fn test_three_dimensional_grid() {
        let mut record = EquationRecord::new();
        record.set_graphical_dimensionality(3).unwrap();
        record.set_equation("z = x * y");
        record.set_x_variable("x (m)");
        record.set_y_variable("y (m)");
        record.set_z_variable("z (m**2)");
        record.set_x_points_specified(&[1.0, 2.0]).unwrap();
        record.set_y_points_specified(&[10.0, 20.0]).unwrap();

        record.evaluate().unwrap();
        assert_eq!(record.x_points(), Some(&[1.0, 1.0, 2.0, 2.0][..]));
        assert_eq!(record.z_units(), Some("m**2"));

        let matrix = record.z_matrix();
        assert_eq!(matrix.get(2.0, 20.0), Some(40.0));
        assert_eq!(matrix.shape(), (2, 2));
    }

    #[test]
    fn test_reversed_grid_cells_match_their_pairs() {
        let mut record = EquationRecord::new();
        record.set_graphical_dimensionality(3).unwrap();
        record.set_equation("z = x*10 + y");
        record.set_x_variable("x");
        record.set_y_variable("y");
        record.set_z_variable("z");
        record.set_x_range_default(&[1.0, 2.0]).unwrap();
        record.set_y_range_default(&[10.0, 20.0]).unwrap();
        record.set_num_of_points(2).unwrap();
        record.set_reverse_scaling(true);

        record.evaluate().unwrap();
        assert_eq!(record.x_points(), Some(&[2.0, 2.0, 1.0, 1.0][..]));

        let matrix = record.z_matrix();
        assert_eq!(matrix.x, vec![1.0, 2.0]);
        assert_eq!(matrix.y, vec![10.0, 20.0]);
        assert_eq!(
            matrix.rows(),
            vec![vec![Some(20.0), Some(30.0)], vec![Some(30.0), Some(40.0)]]
        );
    }

    #[test]
    fn test_descending_specified_points_grid() {
        let mut record = EquationRecord::new();
        record.set_graphical_dimensionality(3).unwrap();
        record.set_equation("z = x - y");
        record.set_x_variable("x");
        record.set_y_variable("y");
        record.set_z_variable("z");
        record.set_x_points_specified(&[3.0, 2.0, 1.0]).unwrap();
        record.set_y_points_specified(&[0.5, 0.0]).unwrap();

        record.evaluate().unwrap();
        let matrix = record.z_matrix();
        assert_eq!(matrix.get(3.0, 0.0), Some(3.0));
        assert_eq!(matrix.get(1.0, 0.5), Some(0.5));
        assert_eq!(matrix.get(2.0, 0.5), Some(1.5));
    }

    #[test]
    fn test_three_dimensional_requires_z_variable() {
        let mut record = EquationRecord::new();
        record.set_graphical_dimensionality(3).unwrap();
        record.set_equation("z = x * y");
        record.set_x_variable("x");
        record.set_y_variable("y");
        record.set_x_points_specified(&[1.0]).unwrap();
        record.set_y_points_specified(&[1.0]).unwrap();

        let err = record.evaluate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingVariable(ref field)) if field == "z_variable"
        ));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let mut record = arrhenius();
        record.set_x_range_default(&[300.0, 400.0]).unwrap();
        record.set_num_of_points(3).unwrap();

        let first = record.evaluate().unwrap().into_value();
        let inputs = record.constants().clone();
        let second = record.evaluate().unwrap().into_value();

        assert_eq!(first, second);
        assert_eq!(record.constants(), &inputs);
    }
}
