use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;

use super::{EquationRecord, EquationOutput};
use crate::{
    errors::{Error, ValidationError},
    sampling::PointsSpacing,
};

/// Constant values may be given as strings or as bare JSON numbers.
pub(super) fn constants<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(name, value)| match value {
            Value::String(s) => Ok((name, s)),
            Value::Number(n) => Ok((name, n.to_string())),
            other => Err(D::Error::custom(format!(
                "constant '{}' must be a string or a number, found {}",
                name, other
            ))),
        })
        .collect()
}

pub(super) fn point_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<i64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) if n > 0 => usize::try_from(n).map(Some).map_err(D::Error::custom),
        Some(n) => Err(D::Error::custom(ValidationError::InvalidPointCount(n))),
    }
}

/// A blank or missing spacing means the default.
pub(super) fn spacing<'de, D>(deserializer: D) -> Result<Option<PointsSpacing>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => {
            serde_json::from_value(Value::String(s.trim().to_string()))
                .map(Some)
                .map_err(D::Error::custom)
        }
        _ => Ok(None),
    }
}

fn with_json_extension(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if has_extension {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }
}

impl EquationRecord {
    /// Builds a record from a JSON object. Missing fields take their
    /// defaults; unknown fields are kept.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        if !value.is_object() {
            return Err(ValidationError::MalformedRecord(format!(
                "expected a JSON object, found {}",
                value
            )));
        }

        let record: Self = serde_json::from_value(value)
            .map_err(|e| ValidationError::MalformedRecord(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(value)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let json = fs::read_to_string(path.as_ref())?;
        debug!("Loaded equation record from {}", path.as_ref().display());
        Self::from_json_str(&json)
    }

    pub fn to_value(&self) -> Result<Value, Error> {
        Ok(serde_json::to_value(self)?)
    }

    /// Renders the record as JSON.
    ///
    /// With `evaluate` the output fields are recomputed first; with
    /// `output_only` only the units and points are rendered.
    pub fn to_json_string(&mut self, pretty: bool, evaluate: bool, output_only: bool) -> Result<String, Error> {
        if evaluate {
            self.evaluate()?;
        }

        let value = if output_only {
            serde_json::to_value(self.output())?
        } else {
            self.to_value()?
        };

        Ok(if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        })
    }

    /// Writes the pretty JSON rendering to `path`, adding a `.json`
    /// extension when it has none. Returns the path written.
    pub fn export_to_json_file(
        &mut self,
        path: impl AsRef<Path>,
        evaluate: bool,
        output_only: bool,
    ) -> Result<PathBuf, Error> {
        let path = with_json_extension(path.as_ref());
        let json = self.to_json_string(true, evaluate, output_only)?;
        fs::write(&path, json)?;
        info!("Exported equation record to {}", path.display());
        Ok(path)
    }
}

impl EquationOutput {
    pub fn to_json_string(&self, pretty: bool) -> Result<String, Error> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_rejects_non_object() {
        let err = EquationRecord::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ValidationError::MalformedRecord(_)));
    }

    #[test]
    fn test_numeric_constants_and_blank_spacing() {
        let record = EquationRecord::from_value(json!({
            "equation_string": "k = A*T",
            "constants": {"A": 2.5, "n": 3, "R": "8.314 J/(mol*K)"},
            "points_spacing": "",
            "num_of_points": 10
        }))
        .unwrap();

        assert_eq!(record.constants()["A"], "2.5");
        assert_eq!(record.constants()["n"], "3");
        assert_eq!(record.points_spacing(), PointsSpacing::Linear);
        assert_eq!(record.num_of_points(), Some(10));
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        assert!(EquationRecord::from_value(json!({"num_of_points": 0})).is_err());
        assert!(EquationRecord::from_value(json!({"constants": {"g": "abc"}})).is_err());
        assert!(EquationRecord::from_value(json!({"x_range_default": [1]})).is_err());
        assert!(EquationRecord::from_value(json!({"graphical_dimensionality": 5})).is_err());
    }

    #[test]
    fn test_unknown_fields_round_trip() {
        let record = EquationRecord::from_value(json!({
            "equation_string": "y = x",
            "comments": "from a figure",
            "x_range_limits": [null, 600]
        }))
        .unwrap();

        assert_eq!(record.extra()["comments"], json!("from a figure"));
        let value = record.to_value().unwrap();
        assert_eq!(value["comments"], json!("from a figure"));
        assert_eq!(value["x_range_limits"], json!([null, 600.0]));
    }

    #[test]
    fn test_json_extension() {
        assert_eq!(with_json_extension(Path::new("out")), PathBuf::from("out.json"));
        assert_eq!(with_json_extension(Path::new("out.JSON")), PathBuf::from("out.JSON"));
        assert_eq!(with_json_extension(Path::new("a.b")), PathBuf::from("a.b.json"));
    }
}
