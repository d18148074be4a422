//! End-to-end tests: JSON record in, evaluated and exported record out.

use equationer::{
    Error, EquationRecord, ValidationError,
    sampling::{GridLayout, PointsSpacing, ZMatrix},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const ARRHENIUS: &str = r#"{
    "equation_string": "k = A * e^((-Ea)/(R*T))",
    "x_variable": "T (K)",
    "y_variable": "k (s**-1)",
    "constants": {
        "A": "1e13",
        "Ea": "40000 J/mol",
        "R": "8.314 J/(mol*K)",
        "e": "2.71828"
    },
    "num_of_points": 4,
    "x_range_default": [200, 500],
    "graphical_dimensionality": 2,
    "source": "lab notebook 7"
}"#;

fn arrhenius_k(t: f64) -> f64 {
    1e13 * 2.71828f64.powf(-40000.0 / (8.314 * t))
}

#[test]
fn test_arrhenius_from_json() {
    let mut record = EquationRecord::from_json_str(ARRHENIUS).unwrap();
    let output = record.evaluate().unwrap();
    assert!(output.is_ok());

    let output = output.into_value();
    assert_eq!(output.x_points, Some(vec![200.0, 300.0, 400.0, 500.0]));
    assert_eq!(output.x_units.as_deref(), Some("K"));
    assert_eq!(output.y_units.as_deref(), Some("s**-1"));
    assert_eq!(output.z_points, None);

    let y = output.y_points.unwrap();
    assert_eq!(y.len(), 4);
    for (t, k) in [200.0, 300.0, 400.0, 500.0].iter().zip(&y) {
        let k = k.unwrap();
        let expected = arrhenius_k(*t);
        assert!((k - expected).abs() / expected < 1e-12, "T = {}: {} != {}", t, k, expected);
    }
}

#[test]
fn test_evaluated_json_keeps_inputs_and_extras() {
    let mut record = EquationRecord::from_json_str(ARRHENIUS).unwrap();
    let rendered = record.to_json_string(false, true, false).unwrap();
    let value: Value = serde_json::from_str(&rendered).unwrap();

    assert_eq!(value["source"], json!("lab notebook 7"));
    assert_eq!(value["constants"]["Ea"], json!("40000 J/mol"));
    assert_eq!(value["x_units"], json!("K"));
    assert_eq!(value["x_points"].as_array().map(Vec::len), Some(4));

    let reloaded = EquationRecord::from_value(value).unwrap();
    assert_eq!(reloaded.x_points(), record.x_points());
    assert_eq!(reloaded.extra(), record.extra());
}

#[test]
fn test_output_only_rendering() {
    let mut record = EquationRecord::from_json_str(ARRHENIUS).unwrap();
    let rendered = record.to_json_string(true, true, true).unwrap();
    let value: Value = serde_json::from_str(&rendered).unwrap();

    let object = value.as_object().unwrap();
    assert!(object.contains_key("x_points"));
    assert!(!object.contains_key("equation_string"));
    assert!(!object.contains_key("source"));
}

#[test]
fn test_export_appends_json_extension() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = EquationRecord::from_json_str(ARRHENIUS).unwrap();

    let written = record
        .export_to_json_file(dir.path().join("arrhenius"), true, false)
        .unwrap();
    assert_eq!(written, dir.path().join("arrhenius.json"));

    let reloaded = EquationRecord::from_json_file(&written).unwrap();
    assert_eq!(reloaded.equation_string(), "k = A * e^((-Ea)/(R*T))");
    assert_eq!(reloaded.y_points().map(<[_]>::len), Some(4));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EquationRecord::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_invalid_json_is_rejected() {
    assert!(matches!(
        EquationRecord::from_json_str("{not json").unwrap_err(),
        Error::Json(_)
    ));
    assert!(matches!(
        EquationRecord::from_json_str(r#"{"num_of_points": -3}"#).unwrap_err(),
        Error::Validation(ValidationError::MalformedRecord(_))
    ));
}

#[test]
fn test_log_spacing_reversed() {
    let mut record = EquationRecord::from_value(json!({
        "equation_string": "y = 2*x",
        "x_variable": "x",
        "y_variable": "y",
        "num_of_points": 3,
        "x_range_default": [1, 100],
        "points_spacing": "log",
        "reverse_scaling": true
    }))
    .unwrap();
    assert_eq!(record.points_spacing(), PointsSpacing::Logarithmic);

    let output = record.evaluate().unwrap().into_value();
    let x = output.x_points.unwrap();
    assert_eq!(x.len(), 3);
    assert_eq!(x[0], 100.0);
    assert!((x[1] - 10.0).abs() < 1e-9);
    assert_eq!(x[2], 1.0);
    assert_eq!(output.y_points.unwrap()[0], Some(200.0));
}

#[test]
fn test_log_spacing_rejects_non_positive_range() {
    let mut record = EquationRecord::from_value(json!({
        "equation_string": "y = x",
        "x_variable": "x",
        "y_variable": "y",
        "num_of_points": 3,
        "x_range_default": [0, 10],
        "points_spacing": "logarithmic"
    }))
    .unwrap();

    let err = record.evaluate().unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::NonPositiveLogRange { .. })
    ));
}

#[test]
fn test_three_dimensional_record() {
    let mut record = EquationRecord::from_value(json!({
        "equation_string": "z = x + 10*y",
        "x_variable": "x (m)",
        "y_variable": "y (s)",
        "z_variable": "z",
        "graphical_dimensionality": 3,
        "num_of_points": 3,
        "x_range_default": [0, 2],
        "y_range_default": [0, 1]
    }))
    .unwrap();

    let output = record.evaluate().unwrap().into_value();
    assert_eq!(output.x_points.as_ref().map(Vec::len), Some(9));
    assert_eq!(output.z_units.as_deref(), Some(""));

    let matrix = record.z_matrix();
    assert_eq!(matrix.shape(), (3, 3));
    assert_eq!(matrix.x, vec![0.0, 1.0, 2.0]);
    assert_eq!(matrix.y, vec![0.0, 0.5, 1.0]);
    assert_eq!(matrix.get(2.0, 1.0), Some(12.0));
    assert_eq!(matrix.get(1.0, 0.5), Some(6.0));
}

#[test]
fn test_paired_matrix_from_series() {
    let matrix = ZMatrix::assemble(
        &[1.0, 2.0],
        &[3.0, 4.0],
        &[Some(5.0), None],
        GridLayout::Paired,
    );
    assert_eq!(matrix.get(1.0, 3.0), Some(5.0));
    assert_eq!(matrix.get(2.0, 4.0), None);
    assert_eq!(matrix.get(1.0, 4.0), None);
}

#[test]
fn test_scaled_output() {
    let mut record = EquationRecord::from_json_str(ARRHENIUS).unwrap();
    let mut output = record.evaluate().unwrap().into_value();

    let ratio = equationer::get_units_scaling_ratio("s**-1", "min**-1").unwrap();
    output.scale(1.0, ratio, 1.0);

    let k = output.y_points.unwrap()[1].unwrap();
    let expected = arrhenius_k(300.0) * 60.0;
    assert!((k - expected).abs() / expected < 1e-9);
}
