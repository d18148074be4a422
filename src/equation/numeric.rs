//! # Numeric Literals
//!
//! This module recognizes the numeric literals that appear in equation
//! strings, in constant values such as `"9.8 m/s**2"`, and in the loosely
//! typed arrays of plotted data series.
//!
//! ## Literal Grammar
//!
//! ```bnf
//! literal  ::= [sign] mantissa [exponent]
//! mantissa ::= digit+ [. digit*] | . digit+
//! exponent ::= {E | e} [sign] digit+
//! sign     ::= + | -
//! ```
//!
//! An exponent marker that is not followed by digits is *not* part of the
//! literal, so `"2eV"` splits into the literal `2` and the remainder `eV`,
//! whereas `"1e13"` is the single literal `1e13`.
//!
//! ## Leading Literals
//!
//! Constant values and series elements only need a *leading* literal; the
//! remainder is unit text (or ignored, for series coercion):
//!
//! ```rust
//! use equationer::equation::numeric::split_leading_literal;
//!
//! let (value, rest) = split_leading_literal("40000 J/mol").unwrap();
//! assert_eq!(value.0, 40000.0);
//! assert_eq!(rest, " J/mol");
//!
//! assert!(split_leading_literal("abc").is_none());
//! ```
//!
//! ## Whole Literals
//!
//! `NumericConstant::from_str` demands that the entire (trimmed) input is a
//! single literal:
//!
//! ```rust
//! use equationer::NumericConstant;
//! use std::str::FromStr;
//!
//! assert_eq!(NumericConstant::from_str("6E5").unwrap().0, 600000.0);
//! assert!(NumericConstant::from_str("1.2.3").is_err());
//! assert!(NumericConstant::from_str("inf").is_err());
//! ```

use log::warn;
use nom::{
    IResult, Parser,
    branch::alt,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{opt, recognize},
};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Errors that can occur during numeric constant parsing.
#[derive(Debug, Error, PartialEq)]
pub enum NumericConstantError {
    /// The input string is empty or contains only whitespace.
    #[error("Empty numeric constant")]
    EmptyNumericConstant,

    /// The input does not start with a numeric literal.
    ///
    /// Examples: `"abc"`, `"e5"`, `"."`
    #[error("No numeric literal at the start of '{0}'")]
    NoLeadingLiteral(String),

    /// A literal was found but more text follows it.
    ///
    /// Examples: `"1.2.3"` (trailing `.3`), `"1a2"` (trailing `a2`)
    #[error("Unexpected trailing characters '{1}' after numeric literal in '{0}'")]
    TrailingCharacters(String, String),

    /// The literal overflowed to infinity.
    #[error("Not a real number: '{0}' is not a finite real number")]
    NotARealNumber(String),
}

/// A finite floating point value parsed from a numeric literal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NumericConstant(pub f64);

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize((one_of("eE"), opt(one_of("+-")), digit1)).parse(input)
}

fn mantissa(input: &str) -> IResult<&str, &str> {
    alt((
        recognize((digit1, opt((char('.'), digit0)))),
        recognize((char('.'), digit1)),
    ))
    .parse(input)
}

/// Recognizes an unsigned numeric literal.
///
/// Used by the expression grammar, where a leading `-` is a unary operator.
pub fn unsigned_literal(input: &str) -> IResult<&str, &str> {
    recognize((mantissa, opt(exponent))).parse(input)
}

/// Recognizes a numeric literal with an optional leading sign.
pub fn signed_literal(input: &str) -> IResult<&str, &str> {
    recognize((opt(one_of("+-")), mantissa, opt(exponent))).parse(input)
}

/// Converts recognized literal text to a finite value.
fn literal_value(full: &str, literal: &str) -> Result<f64, NumericConstantError> {
    // The grammar only admits text that `f64::from_str` accepts.
    match literal.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(NumericConstantError::NotARealNumber(full.to_string())),
    }
}

/// Splits `input` into its leading numeric literal and the remaining text.
///
/// Leading whitespace is skipped; the remainder is returned untrimmed.
/// Returns `None` when the input does not begin with a finite literal.
pub fn split_leading_literal(input: &str) -> Option<(NumericConstant, &str)> {
    let trimmed = input.trim_start();
    let (rest, literal) = signed_literal(trimmed).ok()?;
    let value = literal_value(trimmed, literal).ok()?;
    Some((NumericConstant(value), rest))
}

/// Coerces loosely typed text to a number, ignoring anything after the
/// leading literal. Returns `None` when no literal is present.
pub fn coerce_leading(input: &str) -> Option<f64> {
    split_leading_literal(input).map(|(value, _)| value.0)
}

impl FromStr for NumericConstant {
    type Err = NumericConstantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        if input.is_empty() {
            return Err(NumericConstantError::EmptyNumericConstant);
        }

        let (rest, literal) = signed_literal(input)
            .map_err(|_| NumericConstantError::NoLeadingLiteral(input.to_string()))?;

        if !rest.is_empty() {
            return Err(NumericConstantError::TrailingCharacters(
                input.to_string(),
                rest.to_string(),
            ));
        }

        if literal.starts_with('+') {
            warn!(
                "Numeric constant '{}' starts with a redundant '+' sign, ignoring.",
                input
            );
        }

        literal_value(input, literal).map(NumericConstant)
    }
}

impl From<f64> for NumericConstant {
    fn from(value: f64) -> Self {
        NumericConstant(value)
    }
}

impl From<NumericConstant> for f64 {
    fn from(value: NumericConstant) -> Self {
        value.0
    }
}

impl fmt::Display for NumericConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
