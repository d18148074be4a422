//! # Series Scaling
//!
//! Multiplies already-sampled data by unit scaling ratios. Figures and data
//! series are plain JSON (`{"data": [{"x": [...], "y": [...]}, ...]}`), the
//! shape rendering layers consume.
//!
//! Elements are coerced to numbers before scaling: JSON numbers are used
//! as they are, strings contribute their leading numeric literal (`"12 K"`
//! counts as `12`), and anything else becomes `null`.
//!
//! ```rust
//! use equationer::series::scale_figure;
//! use serde_json::json;
//!
//! let figure = json!({"data": [{"x": [1, 2], "y": ["3", 4]}]});
//! let scaled = scale_figure(&figure, 1000.0, 2.0);
//!
//! assert_eq!(scaled["data"][0]["x"], json!([1000.0, 2000.0]));
//! assert_eq!(scaled["data"][0]["y"], json!([6.0, 8.0]));
//! assert_eq!(figure["data"][0]["x"], json!([1, 2]));
//! ```

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::{equation::numeric::coerce_leading, record::EquationOutput};

fn coerce(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => coerce_leading(s),
        _ => None,
    }
}

fn scale_value(value: &Value, factor: f64) -> Value {
    coerce(value)
        .map(|v| v * factor)
        .filter(|v| v.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

fn scale_axis(series: &mut Map<String, Value>, axis: &str, factor: f64) {
    if factor == 1.0 {
        return;
    }

    match series.get_mut(axis) {
        Some(Value::Array(values)) => {
            for value in values.iter_mut() {
                *value = scale_value(value, factor);
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => warn!("Series field '{}' is not an array, left unscaled: {}", axis, other),
    }
}

/// Scales the `x`, `y` and `z` arrays of one series in place. A factor of
/// exactly `1` leaves that axis untouched, including its element types.
pub fn scale_dataseries<'a>(
    series: &'a mut Map<String, Value>,
    x_factor: f64,
    y_factor: f64,
    z_factor: f64,
) -> &'a mut Map<String, Value> {
    scale_axis(series, "x", x_factor);
    scale_axis(series, "y", y_factor);
    scale_axis(series, "z", z_factor);
    series
}

/// Returns a copy of `figure` with the x and y values of every series in
/// `data` scaled. The input is not modified and z is never scaled.
pub fn scale_figure(figure: &Value, x_factor: f64, y_factor: f64) -> Value {
    let mut scaled = figure.clone();

    let Some(Value::Array(data)) = scaled.get_mut("data") else {
        debug!("Figure has no data array, nothing to scale");
        return scaled;
    };

    for series in data.iter_mut() {
        if let Value::Object(series) = series {
            scale_dataseries(series, x_factor, y_factor, 1.0);
        }
    }

    scaled
}

fn scale_points(points: &mut Option<Vec<Option<f64>>>, factor: f64) {
    points
        .iter_mut()
        .flatten()
        .flatten()
        .for_each(|v| *v *= factor);
}

impl EquationOutput {
    /// Multiplies the points of each axis by its factor.
    pub fn scale(&mut self, x_factor: f64, y_factor: f64, z_factor: f64) -> &mut Self {
        self.x_points
            .iter_mut()
            .flatten()
            .for_each(|v| *v *= x_factor);
        scale_points(&mut self.y_points, y_factor);
        scale_points(&mut self.z_points, z_factor);
        self
    }
}
