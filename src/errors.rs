//! Error types shared across the crate.

use thiserror::Error;

use crate::{equation::EvaluationError, units::UnitConversionError};

/// Malformed equation record fields or sampling configuration.
///
/// These are surfaced immediately and never retried.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A range was not a pair of finite numbers.
    #[error("{field} must be an array of two numeric values, received {received:?}")]
    MalformedRange { field: String, received: Vec<f64> },

    /// Limits were not a pair of numbers or nulls.
    #[error("{field} must be an array of two elements (numeric or null), received {received:?}")]
    MalformedLimits {
        field: String,
        received: Vec<Option<f64>>,
    },

    /// The requested number of points was zero or negative.
    #[error("Number of points must be a positive integer, received {0}")]
    InvalidPointCount(i64),

    /// A constant value did not start with a numeric literal.
    #[error(
        "Invalid format for constant '{name}': '{value}'. Expected a numeric value, optionally followed by a unit."
    )]
    InvalidConstant { name: String, value: String },

    /// Logarithmic spacing over a range that is not strictly positive.
    #[error("Logarithmic spacing requires strictly positive bounds, received [{low}, {high}]")]
    NonPositiveLogRange { low: f64, high: f64 },

    /// A sample fell outside a configured hard limit.
    #[error(
        "{axis} value {value} at index {index} lies outside the limits [{}, {}]",
        fmt_limit(.lower),
        fmt_limit(.upper)
    )]
    OutOfLimits {
        axis: String,
        index: usize,
        value: f64,
        lower: Option<f64>,
        upper: Option<f64>,
    },

    /// A specified point was NaN or infinite.
    #[error("{axis} point at index {index} is not a valid number: {value}")]
    NonFinitePoint { axis: String, index: usize, value: f64 },

    /// Dimensionality other than 2 or 3.
    #[error("graphical_dimensionality must be 2 or 3, received {0}")]
    InvalidDimensionality(u8),

    /// A variable label the evaluation needs was never set.
    #[error("{0} must be set before the equation can be evaluated")]
    MissingVariable(String),

    /// The record document was not a JSON object of the expected shape.
    #[error("Malformed equation record: {0}")]
    MalformedRecord(String),
}

fn fmt_limit(limit: &Option<f64>) -> String {
    limit.map_or_else(|| "unset".to_string(), |v| v.to_string())
}

/// Any failure produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    UnitConversion(#[from] UnitConversionError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_limits_message() {
        let err = ValidationError::OutOfLimits {
            axis: "x".to_string(),
            index: 3,
            value: 700.0,
            lower: None,
            upper: Some(600.0),
        };
        assert_eq!(
            err.to_string(),
            "x value 700 at index 3 lies outside the limits [unset, 600]"
        );
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: Error = ValidationError::InvalidPointCount(0).into();
        assert!(matches!(err, Error::Validation(_)));
    }
}
