//! Constant values of the form `"<number> [unit]"`.
//!
//! A constant must start with a numeric literal; anything after it is unit
//! text. The magnitude is the first whitespace-delimited token when that
//! token is a closed arithmetic expression (`1*10**13 (s**-1)` has magnitude
//! `1e13`), and the leading literal otherwise (`5m` has magnitude `5`).

use std::{collections::BTreeMap, fmt, str::FromStr};

use log::trace;

use crate::{
    equation::{Scope, numeric::split_leading_literal, parse::parse_expression},
    errors::ValidationError,
};

/// A validated constant split into magnitude and unit text.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantValue {
    pub magnitude: f64,
    pub unit: String,
}

impl ConstantValue {
    /// Validates `value` as the constant called `name`.
    pub fn parse(name: &str, value: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidConstant {
            name: name.to_string(),
            value: value.to_string(),
        };

        let (literal, rest) = split_leading_literal(value).ok_or_else(invalid)?;

        let trimmed = value.trim();
        let token_end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (token, after_token) = trimmed.split_at(token_end);

        let parsed = match closed_expression(token) {
            Some(magnitude) => Self {
                magnitude,
                unit: after_token.trim().to_string(),
            },
            None => Self {
                magnitude: literal.0,
                unit: rest.trim().to_string(),
            },
        };

        trace!("Constant '{}' = '{}' parsed as {:?}", name, value, parsed);
        Ok(parsed)
    }
}

impl FromStr for ConstantValue {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("constant", s)
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}

/// Evaluates `token` if it is an expression over literals only.
fn closed_expression(token: &str) -> Option<f64> {
    parse_expression(token)
        .ok()?
        .evaluate(&Scope::new())
        .ok()
        .filter(|v| v.is_finite())
}

/// Checks that `value` starts with a numeric literal.
pub fn validate_constant(name: &str, value: &str) -> Result<(), ValidationError> {
    ConstantValue::parse(name, value).map(|_| ())
}

/// Builds the evaluation scope from a record's constants.
pub fn constants_scope(constants: &BTreeMap<String, String>) -> Result<Scope, ValidationError> {
    constants
        .iter()
        .map(|(name, value)| Ok((name.clone(), ConstantValue::parse(name, value)?.magnitude)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rejects_non_numeric() {
        assert_eq!(
            validate_constant("g", "abc").unwrap_err(),
            ValidationError::InvalidConstant {
                name: "g".to_string(),
                value: "abc".to_string()
            }
        );
        assert!(validate_constant("g", "").is_err());
    }

    #[test]
    fn test_accepts_value_with_unit() {
        let value = ConstantValue::parse("g", "9.8 m/s**2").unwrap();
        assert_eq!(value.magnitude, 9.8);
        assert_eq!(value.unit, "m/s**2");
    }

    #[test]
    fn test_closed_expression_magnitude() {
        let value = ConstantValue::parse("A", "1*10**13 (s**-1)").unwrap();
        assert_eq!(value.magnitude, 1e13);
        assert_eq!(value.unit, "(s**-1)");
    }

    #[test]
    fn test_glued_unit_uses_leading_literal() {
        let value = ConstantValue::parse("d", "5m").unwrap();
        assert_eq!(value.magnitude, 5.0);
        assert_eq!(value.unit, "m");

        let value: ConstantValue = "1e13".parse().unwrap();
        assert_eq!(value.magnitude, 1e13);
        assert_eq!(value.unit, "");
    }

    #[test]
    fn test_scope_from_constants() {
        let constants: BTreeMap<String, String> = [("Ea", "40000 J/mol"), ("R", "8.314 J/(mol*K)")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let scope = constants_scope(&constants).unwrap();
        assert_eq!(scope["Ea"], 40000.0);
        assert_eq!(scope["R"], 8.314);
    }
}
