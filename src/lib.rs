//! Turns equation records into sampled, plottable data and rescales that
//! data between units.
//!
//! - [`record`]: the equation record, its validation and its evaluation
//!   pipeline;
//! - [`equation`]: the expression language and the equation solver;
//! - [`sampling`]: range expansion and z-matrix assembly;
//! - [`units`]: unit text normalization and scaling ratios;
//! - [`series`]: applying scaling ratios to sampled data.

pub mod equation;
pub mod errors;
pub mod record;
pub mod sampling;
pub mod series;
pub mod types;
pub mod units;

pub use crate::equation::{Expression, NumericConstant, Operator};
pub use crate::errors::{Error, Result, ValidationError};
pub use crate::record::{EquationOutput, EquationRecord};
pub use crate::units::{UnitConversionError, get_units_scaling_ratio};
