//! # Range Sampling
//!
//! Expands a range, spacing mode and point count (or an explicit list of
//! points) into the ordered independent-variable values to evaluate.
//!
//! The policy, in order:
//!
//! 1. Explicitly specified points are used verbatim when present.
//! 2. Otherwise `num_of_points` samples span the default range inclusively,
//!    spaced linearly or logarithmically.
//! 3. Every sample must lie within the hard limits; a sample outside a set
//!    limit is an error, never clipped.
//! 4. Reverse scaling reverses the final order.
//!
//! ```rust
//! use equationer::sampling::{PointsSpacing, RangeSampler};
//!
//! let samples = RangeSampler::new([1.0, 100.0], 3)
//!     .spacing(PointsSpacing::Logarithmic)
//!     .sample()
//!     .unwrap();
//! assert_eq!(samples.len(), 3);
//! assert_eq!((samples[0], samples[2]), (1.0, 100.0));
//! assert!((samples[1] - 10.0).abs() < 1e-9);
//! ```

use log::trace;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// How generated samples are distributed across a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointsSpacing {
    #[default]
    #[serde(alias = "linear")]
    Linear,
    #[serde(alias = "logarithmic", alias = "log", alias = "Log")]
    Logarithmic,
}

/// Sampling configuration for one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSampler {
    axis: String,
    range: [f64; 2],
    limits: [Option<f64>; 2],
    points_specified: Vec<f64>,
    spacing: PointsSpacing,
    num_of_points: usize,
    reverse: bool,
}

impl RangeSampler {
    pub fn new(range: [f64; 2], num_of_points: usize) -> Self {
        Self {
            axis: "x".to_string(),
            range,
            limits: [None, None],
            points_specified: Vec::new(),
            spacing: PointsSpacing::Linear,
            num_of_points,
            reverse: false,
        }
    }

    /// Names the axis in error messages.
    pub fn axis(mut self, axis: impl Into<String>) -> Self {
        self.axis = axis.into();
        self
    }

    pub fn limits(mut self, limits: [Option<f64>; 2]) -> Self {
        self.limits = limits;
        self
    }

    pub fn points_specified(mut self, points: Vec<f64>) -> Self {
        self.points_specified = points;
        self
    }

    pub fn spacing(mut self, spacing: PointsSpacing) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Produces the samples, eagerly.
    pub fn sample(&self) -> Result<Vec<f64>, ValidationError> {
        let mut samples = if self.points_specified.is_empty() {
            self.generate()?
        } else {
            self.points_specified.clone()
        };

        self.check_limits(&samples)?;

        if self.reverse {
            samples.reverse();
        }

        trace!("Sampled {} {} values: {:?}", samples.len(), self.axis, samples);
        Ok(samples)
    }

    fn generate(&self) -> Result<Vec<f64>, ValidationError> {
        let [low, high] = self.range;
        if !low.is_finite() || !high.is_finite() {
            return Err(ValidationError::MalformedRange {
                field: format!("{}_range_default", self.axis),
                received: self.range.to_vec(),
            });
        }

        if self.num_of_points == 0 {
            return Err(ValidationError::InvalidPointCount(0));
        }

        match self.spacing {
            PointsSpacing::Linear => Ok(interpolate(low, high, self.num_of_points, |v| v, |v| v)),
            PointsSpacing::Logarithmic => {
                if low <= 0.0 || high <= 0.0 {
                    return Err(ValidationError::NonPositiveLogRange { low, high });
                }
                Ok(interpolate(low, high, self.num_of_points, f64::ln, f64::exp))
            }
        }
    }

    fn check_limits(&self, samples: &[f64]) -> Result<(), ValidationError> {
        let [lower, upper] = self.limits;

        for (index, &value) in samples.iter().enumerate() {
            if !value.is_finite() {
                return Err(ValidationError::NonFinitePoint {
                    axis: self.axis.clone(),
                    index,
                    value,
                });
            }

            let below = lower.is_some_and(|l| value < l);
            let above = upper.is_some_and(|u| value > u);
            if below || above {
                return Err(ValidationError::OutOfLimits {
                    axis: self.axis.clone(),
                    index,
                    value,
                    lower,
                    upper,
                });
            }
        }

        Ok(())
    }
}

/// Evenly spaced points in the space defined by `forward`, mapped back with
/// `inverse`. Both endpoints are reproduced exactly, and the weighted form
/// stays finite for any pair of finite bounds.
fn interpolate(
    low: f64,
    high: f64,
    n: usize,
    forward: impl Fn(f64) -> f64,
    inverse: impl Fn(f64) -> f64,
) -> Vec<f64> {
    if n == 1 {
        return vec![low];
    }

    let (a, b) = (forward(low), forward(high));
    let last = n - 1;
    (0..n)
        .map(|i| match i {
            0 => low,
            i if i == last => high,
            i => {
                let t = i as f64 / last as f64;
                inverse(a * (1.0 - t) + b * t)
            }
        })
        .collect()
}
