//! # Unit Scaling
//!
//! Computes the factor that converts a quantity in one unit string to
//! another. Both strings go through the same preparation before reaching
//! the backend:
//!
//! 1. identical strings short-circuit to `1`;
//! 2. `^` becomes `**`;
//! 3. micro-prefixed units are tagged as custom tokens, and every tagged
//!    token is registered with the custom-unit registry and the backend;
//! 4. tag delimiters are stripped and the backend is asked for the ratio;
//! 5. on failure, reciprocal notation is rewritten to negative exponents
//!    and the conversion is retried once.
//!
//! ```rust
//! use equationer::units::{CustomUnitRegistry, SiBackend, UnitScalingEngine};
//!
//! let registry = CustomUnitRegistry::new();
//! let engine = UnitScalingEngine::new(SiBackend::new(), &registry);
//!
//! assert_eq!(engine.scaling_ratio("kg/m/s", "g/m/s").unwrap(), 1000.0);
//! assert_eq!(engine.scaling_ratio("µm", "µm").unwrap(), 1.0);
//! ```

use log::{debug, warn};
use thiserror::Error;

use super::{
    backend::{BackendError, SiBackend, UnitBackend},
    normalize::{
        DEFAULT_INVERSE_DEPTH, canonicalize_micro_signs, convert_inverse_units,
        extract_tagged_strings, remove_tagged_strings, tag_micro_units,
    },
    registry::CustomUnitRegistry,
};
use crate::equation::evaluator::normalize_exponents;

/// A conversion that failed even after the reciprocal-unit retry.
///
/// Every variant keeps both original unit strings and the processed
/// strings that were last handed to the backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UnitConversionError {
    #[error(
        "Error during unit conversion: {message}. Ensure all unit definitions are correctly set. Unit 1: {original_a}, Unit 2: {original_b}. Processed Unit 1: {processed_a}, Processed Unit 2: {processed_b}"
    )]
    UnitNotFound {
        original_a: String,
        original_b: String,
        processed_a: String,
        processed_b: String,
        message: String,
    },

    #[error(
        "Error during unit conversion: {message}. Make sure unit values are valid and properly formatted. Unit 1: {original_a}, Unit 2: {original_b}. Processed Unit 1: {processed_a}, Processed Unit 2: {processed_b}"
    )]
    MalformedExpression {
        original_a: String,
        original_b: String,
        processed_a: String,
        processed_b: String,
        message: String,
    },

    #[error(
        "An unexpected error occurred when trying to convert units: {message}. Double-check that your records have the same units. Original Unit 1: {original_a}, Original Unit 2: {original_b}. Processed Unit 1: {processed_a}, Processed Unit 2: {processed_b}"
    )]
    Unexpected {
        original_a: String,
        original_b: String,
        processed_a: String,
        processed_b: String,
        message: String,
    },
}

impl UnitConversionError {
    fn from_backend(error: BackendError, original: (&str, &str), processed: (&str, &str)) -> Self {
        let original_a = original.0.to_string();
        let original_b = original.1.to_string();
        let processed_a = processed.0.to_string();
        let processed_b = processed.1.to_string();
        let message = error.to_string();

        match error {
            BackendError::UnknownUnit(_) => UnitConversionError::UnitNotFound {
                original_a,
                original_b,
                processed_a,
                processed_b,
                message,
            },
            BackendError::Malformed { .. } => UnitConversionError::MalformedExpression {
                original_a,
                original_b,
                processed_a,
                processed_b,
                message,
            },
            BackendError::IncompatibleDimensions { .. } | BackendError::Other(_) => {
                UnitConversionError::Unexpected {
                    original_a,
                    original_b,
                    processed_a,
                    processed_b,
                    message,
                }
            }
        }
    }

    /// The `(first, second)` unit strings as passed in.
    pub fn originals(&self) -> (&str, &str) {
        match self {
            UnitConversionError::UnitNotFound {
                original_a,
                original_b,
                ..
            }
            | UnitConversionError::MalformedExpression {
                original_a,
                original_b,
                ..
            }
            | UnitConversionError::Unexpected {
                original_a,
                original_b,
                ..
            } => (original_a, original_b),
        }
    }

    /// The `(first, second)` unit strings after normalization.
    pub fn processed(&self) -> (&str, &str) {
        match self {
            UnitConversionError::UnitNotFound {
                processed_a,
                processed_b,
                ..
            }
            | UnitConversionError::MalformedExpression {
                processed_a,
                processed_b,
                ..
            }
            | UnitConversionError::Unexpected {
                processed_a,
                processed_b,
                ..
            } => (processed_a, processed_b),
        }
    }
}

/// Converts between unit strings through a [`UnitBackend`].
pub struct UnitScalingEngine<'r, B: UnitBackend> {
    backend: B,
    registry: &'r CustomUnitRegistry,
    inverse_depth: usize,
}

impl<'r, B: UnitBackend> UnitScalingEngine<'r, B> {
    pub fn new(backend: B, registry: &'r CustomUnitRegistry) -> Self {
        Self {
            backend,
            registry,
            inverse_depth: DEFAULT_INVERSE_DEPTH,
        }
    }

    /// Caps the reciprocal rewriting passes used on retry.
    pub fn with_inverse_depth(mut self, depth: usize) -> Self {
        self.inverse_depth = depth;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &CustomUnitRegistry {
        self.registry
    }

    /// Exponent normalization, micro tagging and custom-token registration.
    /// Returns the string with its tag delimiters removed.
    fn prepare(&self, units: &str) -> String {
        let tagged = tag_micro_units(&canonicalize_micro_signs(&normalize_exponents(units)));

        for token in extract_tagged_strings(&tagged) {
            self.registry.register(&token);
            self.backend.register_custom_unit(&token);
        }

        remove_tagged_strings(&tagged)
    }

    /// The factor converting a quantity in `units_a` to `units_b`.
    pub fn scaling_ratio(&self, units_a: &str, units_b: &str) -> Result<f64, UnitConversionError> {
        if units_a == units_b {
            return Ok(1.0);
        }

        let processed_a = self.prepare(units_a);
        let processed_b = self.prepare(units_b);

        let first_error = match self.backend.convert(&processed_a, &processed_b) {
            Ok(ratio) => {
                debug!("Scaling ratio '{}' -> '{}' = {}", units_a, units_b, ratio);
                return Ok(ratio);
            }
            Err(e) => e,
        };

        warn!("Attempting inverse unit conversion fix for: {}", first_error);
        let retried_a = convert_inverse_units(&processed_a, self.inverse_depth);
        let retried_b = convert_inverse_units(&processed_b, self.inverse_depth);

        self.backend
            .convert(&retried_a, &retried_b)
            .inspect(|ratio| debug!("Scaling ratio '{}' -> '{}' = {} (after retry)", units_a, units_b, ratio))
            .map_err(|e| {
                UnitConversionError::from_backend(e, (units_a, units_b), (&retried_a, &retried_b))
            })
    }
}

/// Scaling ratio using the built-in backend and the process-wide registry.
pub fn get_units_scaling_ratio(units_a: &str, units_b: &str) -> Result<f64, UnitConversionError> {
    UnitScalingEngine::new(SiBackend::new(), CustomUnitRegistry::global()).scaling_ratio(units_a, units_b)
}
