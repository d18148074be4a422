//! # Equation Records
//!
//! An [`EquationRecord`] describes one equation together with everything
//! needed to turn it into plottable points: the variable labels (each a
//! `"name (unit)"` string), the constants, and the sampling configuration
//! for the independent axes. Evaluation fills in the output fields
//! (`x_units`, `x_points`, ...).
//!
//! In a 2-D record x is sampled and y is the dependent variable. In a 3-D
//! record both x and y are sampled over their cross product and z is the
//! dependent variable.
//!
//! ```rust
//! use equationer::record::EquationRecord;
//!
//! let mut record = EquationRecord::new();
//! record.set_equation("k = A * e^((-Ea)/(R*T))");
//! record.set_x_variable("T (K)");
//! record.set_y_variable("k (s**-1)");
//! record
//!     .add_constants([
//!         ("A", "1e13"),
//!         ("Ea", "40000 J/mol"),
//!         ("R", "8.314 J/(mol*K)"),
//!         ("e", "2.71828"),
//!     ])
//!     .unwrap();
//! record.set_x_range_default(&[200.0, 500.0]).unwrap();
//! record.set_num_of_points(4).unwrap();
//!
//! let output = record.evaluate().unwrap().into_value();
//! assert_eq!(output.x_points, Some(vec![200.0, 300.0, 400.0, 500.0]));
//! assert_eq!(output.y_units.as_deref(), Some("s**-1"));
//! ```

mod constants;
mod evaluate;
mod json;
mod labels;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::ValidationError,
    sampling::{GridLayout, PointsSpacing, RangeSampler, ZMatrix},
};

pub use constants::{ConstantValue, constants_scope, validate_constant};
pub use labels::split_label_units;

/// Dimensionality assumed when a record does not state one.
pub const DEFAULT_DIMENSIONALITY: u8 = 2;

fn default_range() -> [f64; 2] {
    [0.0, 1.0]
}

/// An equation with its variables, constants and sampling configuration.
///
/// Fields are private so that every mutation goes through a validating
/// setter. Fields this type does not know about are kept in
/// [`extra`](EquationRecord::extra) and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationRecord {
    #[serde(default)]
    equation_string: String,
    #[serde(default)]
    x_variable: String,
    #[serde(default)]
    y_variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    z_variable: Option<String>,
    #[serde(default, deserialize_with = "json::constants")]
    constants: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "json::point_count")]
    num_of_points: Option<usize>,
    #[serde(default = "default_range")]
    x_range_default: [f64; 2],
    #[serde(default)]
    x_range_limits: [Option<f64>; 2],
    #[serde(default)]
    x_points_specified: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y_range_default: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y_range_limits: Option<[Option<f64>; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    y_points_specified: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    z_range_default: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    z_range_limits: Option<[Option<f64>; 2]>,
    #[serde(
        default,
        deserialize_with = "json::spacing",
        skip_serializing_if = "Option::is_none"
    )]
    points_spacing: Option<PointsSpacing>,
    #[serde(default)]
    reverse_scaling: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    graphical_dimensionality: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    x_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    z_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x_points: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y_points: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    z_points: Option<Vec<Option<f64>>>,

    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl Default for EquationRecord {
    fn default() -> Self {
        Self {
            equation_string: String::new(),
            x_variable: String::new(),
            y_variable: String::new(),
            z_variable: None,
            constants: BTreeMap::new(),
            num_of_points: None,
            x_range_default: default_range(),
            x_range_limits: [None, None],
            x_points_specified: Vec::new(),
            y_range_default: None,
            y_range_limits: None,
            y_points_specified: Vec::new(),
            z_range_default: None,
            z_range_limits: None,
            points_spacing: None,
            reverse_scaling: false,
            graphical_dimensionality: None,
            x_units: None,
            y_units: None,
            z_units: None,
            x_points: None,
            y_points: None,
            z_points: None,
            extra: BTreeMap::new(),
        }
    }
}

/// The units and points of an evaluated record, without its inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquationOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_points: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_points: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_points: Option<Vec<Option<f64>>>,
}

fn check_range(field: &str, values: &[f64]) -> Result<[f64; 2], ValidationError> {
    match values {
        [low, high] if low.is_finite() && high.is_finite() => Ok([*low, *high]),
        _ => Err(ValidationError::MalformedRange {
            field: field.to_string(),
            received: values.to_vec(),
        }),
    }
}

fn check_limits(field: &str, values: &[Option<f64>]) -> Result<[Option<f64>; 2], ValidationError> {
    let finite = |v: &Option<f64>| v.is_none_or(f64::is_finite);
    match values {
        [lower, upper] if finite(lower) && finite(upper) => Ok([*lower, *upper]),
        _ => Err(ValidationError::MalformedLimits {
            field: field.to_string(),
            received: values.to_vec(),
        }),
    }
}

fn check_points(axis: &str, values: &[f64]) -> Result<Vec<f64>, ValidationError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ValidationError::NonFinitePoint {
            axis: axis.to_string(),
            index,
            value: values[index],
        }),
        None => Ok(values.to_vec()),
    }
}

impl EquationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_equation(&mut self, equation: impl Into<String>) {
        self.equation_string = equation.into();
    }

    /// Sets the x label, e.g. `"T (K)"`.
    pub fn set_x_variable(&mut self, label: impl Into<String>) {
        self.x_variable = label.into();
    }

    /// Sets the y label, e.g. `"k (s**-1)"`.
    pub fn set_y_variable(&mut self, label: impl Into<String>) {
        self.y_variable = label.into();
    }

    /// Sets the z label, e.g. `"E (J)"`.
    pub fn set_z_variable(&mut self, label: impl Into<String>) {
        self.z_variable = Some(label.into());
    }

    pub fn set_x_range_default(&mut self, range: &[f64]) -> Result<(), ValidationError> {
        self.x_range_default = check_range("x_range_default", range)?;
        Ok(())
    }

    pub fn set_x_range_limits(&mut self, limits: &[Option<f64>]) -> Result<(), ValidationError> {
        self.x_range_limits = check_limits("x_range_limits", limits)?;
        Ok(())
    }

    pub fn set_x_points_specified(&mut self, points: &[f64]) -> Result<(), ValidationError> {
        self.x_points_specified = check_points("x", points)?;
        Ok(())
    }

    pub fn set_y_range_default(&mut self, range: &[f64]) -> Result<(), ValidationError> {
        self.y_range_default = Some(check_range("y_range_default", range)?);
        Ok(())
    }

    pub fn set_y_range_limits(&mut self, limits: &[Option<f64>]) -> Result<(), ValidationError> {
        self.y_range_limits = Some(check_limits("y_range_limits", limits)?);
        Ok(())
    }

    pub fn set_y_points_specified(&mut self, points: &[f64]) -> Result<(), ValidationError> {
        self.y_points_specified = check_points("y", points)?;
        Ok(())
    }

    pub fn set_z_range_default(&mut self, range: &[f64]) -> Result<(), ValidationError> {
        self.z_range_default = Some(check_range("z_range_default", range)?);
        Ok(())
    }

    pub fn set_z_range_limits(&mut self, limits: &[Option<f64>]) -> Result<(), ValidationError> {
        self.z_range_limits = Some(check_limits("z_range_limits", limits)?);
        Ok(())
    }

    pub fn set_num_of_points(&mut self, points: i64) -> Result<(), ValidationError> {
        let count = usize::try_from(points)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(ValidationError::InvalidPointCount(points))?;
        self.num_of_points = Some(count);
        Ok(())
    }

    pub fn set_points_spacing(&mut self, spacing: PointsSpacing) {
        self.points_spacing = Some(spacing);
    }

    pub fn set_reverse_scaling(&mut self, reverse: bool) {
        self.reverse_scaling = reverse;
    }

    pub fn set_graphical_dimensionality(&mut self, dimensionality: u8) -> Result<(), ValidationError> {
        if !matches!(dimensionality, 2 | 3) {
            return Err(ValidationError::InvalidDimensionality(dimensionality));
        }
        self.graphical_dimensionality = Some(dimensionality);
        Ok(())
    }

    /// Adds or replaces one constant after validating its value.
    pub fn add_constant(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.add_constants([(name, value)])
    }

    /// Adds or replaces several constants.
    ///
    /// Every value is validated before any is inserted, so on error the
    /// record is left exactly as it was.
    pub fn add_constants<I, K, V>(&mut self, constants: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let staged = constants
            .into_iter()
            .map(|(name, value)| {
                let (name, value) = (name.into(), value.into());
                validate_constant(&name, &value)?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        self.constants.extend(staged);
        Ok(())
    }

    pub fn equation_string(&self) -> &str {
        &self.equation_string
    }

    pub fn x_variable(&self) -> &str {
        &self.x_variable
    }

    pub fn y_variable(&self) -> &str {
        &self.y_variable
    }

    pub fn z_variable(&self) -> Option<&str> {
        self.z_variable.as_deref()
    }

    pub fn constants(&self) -> &BTreeMap<String, String> {
        &self.constants
    }

    pub fn num_of_points(&self) -> Option<usize> {
        self.num_of_points
    }

    pub fn x_range_default(&self) -> [f64; 2] {
        self.x_range_default
    }

    pub fn x_range_limits(&self) -> [Option<f64>; 2] {
        self.x_range_limits
    }

    pub fn x_points_specified(&self) -> &[f64] {
        &self.x_points_specified
    }

    pub fn y_range_default(&self) -> Option<[f64; 2]> {
        self.y_range_default
    }

    pub fn y_range_limits(&self) -> Option<[Option<f64>; 2]> {
        self.y_range_limits
    }

    pub fn y_points_specified(&self) -> &[f64] {
        &self.y_points_specified
    }

    pub fn z_range_default(&self) -> Option<[f64; 2]> {
        self.z_range_default
    }

    pub fn z_range_limits(&self) -> Option<[Option<f64>; 2]> {
        self.z_range_limits
    }

    /// Spacing, `Linear` when unset.
    pub fn points_spacing(&self) -> PointsSpacing {
        self.points_spacing.unwrap_or_default()
    }

    pub fn reverse_scaling(&self) -> bool {
        self.reverse_scaling
    }

    /// Dimensionality, [`DEFAULT_DIMENSIONALITY`] when unset.
    pub fn graphical_dimensionality(&self) -> u8 {
        self.graphical_dimensionality
            .unwrap_or(DEFAULT_DIMENSIONALITY)
    }

    pub fn is_three_dimensional(&self) -> bool {
        self.graphical_dimensionality() == 3
    }

    /// Fields carried through from the source document without
    /// interpretation.
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    pub fn x_units(&self) -> Option<&str> {
        self.x_units.as_deref()
    }

    pub fn y_units(&self) -> Option<&str> {
        self.y_units.as_deref()
    }

    pub fn z_units(&self) -> Option<&str> {
        self.z_units.as_deref()
    }

    pub fn x_points(&self) -> Option<&[f64]> {
        self.x_points.as_deref()
    }

    pub fn y_points(&self) -> Option<&[Option<f64>]> {
        self.y_points.as_deref()
    }

    pub fn z_points(&self) -> Option<&[Option<f64>]> {
        self.z_points.as_deref()
    }

    /// The units and points computed by the last evaluation.
    pub fn output(&self) -> EquationOutput {
        EquationOutput {
            x_units: self.x_units.clone(),
            y_units: self.y_units.clone(),
            z_units: self.z_units.clone(),
            x_points: self.x_points.clone(),
            y_points: self.y_points.clone(),
            z_points: self.z_points.clone(),
        }
    }

    /// Reshapes the evaluated points into a matrix indexed by the unique
    /// sorted x and y values.
    ///
    /// Every z value is placed at its own `(x, y)` pair, so the sweep order
    /// (reversed or descending axes included) does not matter.
    pub fn z_matrix(&self) -> ZMatrix {
        let x = self.x_points.as_deref().unwrap_or_default();
        let y = self
            .y_points
            .iter()
            .flatten()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect::<Vec<_>>();
        let z = self.z_points.as_deref().unwrap_or_default();

        ZMatrix::assemble(x, &y, z, GridLayout::Paired)
    }

    fn sampler(
        &self,
        axis: &str,
        range: Option<[f64; 2]>,
        limits: [Option<f64>; 2],
        points: &[f64],
    ) -> Result<RangeSampler, ValidationError> {
        let num_of_points = match (self.num_of_points, points.is_empty()) {
            (Some(n), _) => n,
            (None, false) => points.len(),
            (None, true) => return Err(ValidationError::MissingVariable("num_of_points".to_string())),
        };
        let range = match (range, points.is_empty()) {
            (Some(range), _) => range,
            (None, false) => [0.0, 0.0],
            (None, true) => return Err(ValidationError::MissingVariable(format!("{}_range_default", axis))),
        };

        Ok(RangeSampler::new(range, num_of_points)
            .axis(axis)
            .limits(limits)
            .points_specified(points.to_vec())
            .spacing(self.points_spacing())
            .reversed(self.reverse_scaling))
    }

    /// Checks every stored field against the setter rules. Used on records
    /// that were deserialized rather than built through setters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("x_range_default", &self.x_range_default)?;
        check_limits("x_range_limits", &self.x_range_limits)?;
        check_points("x", &self.x_points_specified)?;

        if let Some(range) = self.y_range_default {
            check_range("y_range_default", &range)?;
        }
        if let Some(limits) = self.y_range_limits {
            check_limits("y_range_limits", &limits)?;
        }
        check_points("y", &self.y_points_specified)?;

        if let Some(range) = self.z_range_default {
            check_range("z_range_default", &range)?;
        }
        if let Some(limits) = self.z_range_limits {
            check_limits("z_range_limits", &limits)?;
        }

        for (name, value) in &self.constants {
            validate_constant(name, value)?;
        }

        match self.graphical_dimensionality {
            Some(d) if !matches!(d, 2 | 3) => Err(ValidationError::InvalidDimensionality(d)),
            _ => Ok(()),
        }
    }
}
