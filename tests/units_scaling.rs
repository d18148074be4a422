//! Unit scaling ratios through the built-in backend.

use equationer::units::{
    CustomUnitRegistry, SiBackend, UnitConversionError, UnitScalingEngine, get_units_scaling_ratio,
    normalize::{extract_tagged_strings, return_custom_units_markup, tag_micro_units},
};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0),
        "{} != {}",
        actual,
        expected
    );
}

#[test]
fn test_common_ratios() {
    assert_close(get_units_scaling_ratio("kJ/mol", "J/mol").unwrap(), 1000.0);
    assert_close(get_units_scaling_ratio("atm", "Pa").unwrap(), 101325.0);
    assert_close(get_units_scaling_ratio("cm^3", "L").unwrap(), 1e-3);
    assert_close(get_units_scaling_ratio("mol/L", "M").unwrap(), 1.0);
    assert_close(get_units_scaling_ratio("h", "min").unwrap(), 60.0);
}

#[test]
fn test_identical_strings_need_no_backend() {
    assert_eq!(get_units_scaling_ratio("frobnitz", "frobnitz").unwrap(), 1.0);
}

#[test]
fn test_reciprocal_units() {
    assert_close(get_units_scaling_ratio("1/s", "1/min").unwrap(), 60.0);
    assert_close(get_units_scaling_ratio("1/(1/bar)", "Pa").unwrap(), 1e5);
}

#[test]
fn test_micro_units_convert_among_themselves() {
    let registry = CustomUnitRegistry::new();
    let engine = UnitScalingEngine::new(SiBackend::new(), &registry);

    assert_close(engine.scaling_ratio("µmol/s", "µmol/min").unwrap(), 60.0);
    assert_close(engine.scaling_ratio("μmol/s", "µmol/min").unwrap(), 60.0);
    assert_eq!(registry.tokens(), vec!["microfrogmol".to_string()]);
}

#[test]
fn test_incompatible_units() {
    let err = get_units_scaling_ratio("kg", "m").unwrap_err();
    assert!(matches!(err, UnitConversionError::Unexpected { .. }));
    assert_eq!(err.originals(), ("kg", "m"));
}

#[test]
fn test_unknown_units() {
    let err = get_units_scaling_ratio("furlong", "m").unwrap_err();
    assert!(matches!(err, UnitConversionError::UnitNotFound { .. }));
}

#[test]
fn test_markup_round_trip() {
    let tagged = tag_micro_units("µm/s");
    let tokens = extract_tagged_strings(&tagged);
    assert_eq!(tokens, vec!["microfrogm".to_string()]);

    let plain = tagged.replace(['<', '>'], "");
    assert_eq!(return_custom_units_markup(&plain, &tokens), tagged);
}
