//! # Unit Conversion Backends
//!
//! A backend turns a pair of unit strings into a conversion ratio. The
//! scaling engine only talks to backends through [`UnitBackend`], so a
//! different conversion library can be plugged in without touching the
//! normalization logic.
//!
//! [`SiBackend`] is the built-in implementation. It understands:
//!
//! - the SI base and common derived units, plus a handful of customary ones
//!   (`min`, `h`, `bar`, `atm`, `psi`, `cal`, `eV`, ...);
//! - metric prefixes, tried longest first (`dam` is deca-metre, `mm` is
//!   milli-metre);
//! - products (`*` or whitespace), quotients (`/`) and integer powers
//!   (`**` or `^`, optionally parenthesised as in `s**(-1)`);
//! - numeric factors (`1/s`, `1000*g`);
//! - registered custom tokens, each treated as an independent base
//!   dimension.
//!
//! ```rust
//! use equationer::units::backend::{SiBackend, UnitBackend};
//!
//! let backend = SiBackend::new();
//! assert_eq!(backend.convert("kg", "g").unwrap(), 1000.0);
//! assert!(backend.convert("kg", "s").is_err());
//! ```

use std::collections::BTreeMap;

use log::trace;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0, multispace1, one_of, satisfy},
    combinator::{all_consuming, map, map_res, not, opt, peek, recognize, value},
    sequence::{delimited, pair, preceded, terminated},
};
use thiserror::Error;

use super::registry::CustomUnitRegistry;
use crate::equation::numeric::unsigned_literal;

/// Failure reported by a [`UnitBackend`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("Missing key: unit '{0}' is not defined")]
    UnknownUnit(String),

    #[error("'{expression}' is not a properly formatted unit expression: {message}")]
    Malformed { expression: String, message: String },

    #[error("Cannot convert from '{from}' to '{to}': dimensions differ")]
    IncompatibleDimensions { from: String, to: String },

    /// Anything else an external backend may report.
    #[error("{0}")]
    Other(String),
}

/// The conversion capability the scaling engine depends on.
pub trait UnitBackend {
    /// Makes `token` usable as a unit in later conversions. Registering the
    /// same token again must succeed and change nothing.
    fn register_custom_unit(&self, token: &str);

    /// The factor that converts a quantity in `from` to `to`.
    fn convert(&self, from: &str, to: &str) -> Result<f64, BackendError>;
}

impl<B: UnitBackend + ?Sized> UnitBackend for &B {
    fn register_custom_unit(&self, token: &str) {
        (**self).register_custom_unit(token)
    }

    fn convert(&self, from: &str, to: &str) -> Result<f64, BackendError> {
        (**self).convert(from, to)
    }
}

/// A magnitude relative to coherent SI, with integer dimension exponents.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimensioned {
    pub factor: f64,
    pub dimension: BTreeMap<String, i32>,
}

impl Dimensioned {
    pub fn scalar(factor: f64) -> Self {
        Self {
            factor,
            dimension: BTreeMap::new(),
        }
    }

    fn from_exponents(factor: f64, exponents: &[(&str, i32)]) -> Self {
        let mut quantity = Self::scalar(factor);
        for (name, exponent) in exponents {
            quantity.add_exponent(name, *exponent);
        }
        quantity
    }

    fn add_exponent(&mut self, name: &str, exponent: i32) {
        let entry = self.dimension.entry(name.to_string()).or_insert(0);
        *entry += exponent;
        if *entry == 0 {
            self.dimension.remove(name);
        }
    }

    fn multiply(mut self, other: &Self) -> Self {
        self.factor *= other.factor;
        for (name, exponent) in &other.dimension {
            self.add_exponent(name, *exponent);
        }
        self
    }

    fn divide(self, other: &Self) -> Self {
        self.multiply(&other.clone().powi(-1))
    }

    fn powi(mut self, n: i32) -> Self {
        self.factor = self.factor.powi(n);
        self.dimension.values_mut().for_each(|e| *e *= n);
        self.dimension.retain(|_, e| *e != 0);
        self
    }
}

const LENGTH: &str = "length";
const MASS: &str = "mass";
const TIME: &str = "time";
const CURRENT: &str = "current";
const TEMPERATURE: &str = "temperature";
const AMOUNT: &str = "amount";
const LUMINOSITY: &str = "luminosity";

struct UnitDefinition {
    symbol: &'static str,
    factor: f64,
    dimension: &'static [(&'static str, i32)],
    prefixable: bool,
}

const fn unit(
    symbol: &'static str,
    factor: f64,
    dimension: &'static [(&'static str, i32)],
    prefixable: bool,
) -> UnitDefinition {
    UnitDefinition {
        symbol,
        factor,
        dimension,
        prefixable,
    }
}

const FORCE: &[(&str, i32)] = &[(MASS, 1), (LENGTH, 1), (TIME, -2)];
const ENERGY: &[(&str, i32)] = &[(MASS, 1), (LENGTH, 2), (TIME, -2)];
const POWER: &[(&str, i32)] = &[(MASS, 1), (LENGTH, 2), (TIME, -3)];
const PRESSURE: &[(&str, i32)] = &[(MASS, 1), (LENGTH, -1), (TIME, -2)];
const VOLUME: &[(&str, i32)] = &[(LENGTH, 3)];

const UNITS: &[UnitDefinition] = &[
    // SI base
    unit("m", 1.0, &[(LENGTH, 1)], true),
    unit("g", 1e-3, &[(MASS, 1)], true),
    unit("s", 1.0, &[(TIME, 1)], true),
    unit("A", 1.0, &[(CURRENT, 1)], true),
    unit("K", 1.0, &[(TEMPERATURE, 1)], true),
    unit("mol", 1.0, &[(AMOUNT, 1)], true),
    unit("cd", 1.0, &[(LUMINOSITY, 1)], true),
    unit("meter", 1.0, &[(LENGTH, 1)], false),
    unit("gram", 1e-3, &[(MASS, 1)], false),
    unit("second", 1.0, &[(TIME, 1)], false),
    unit("kelvin", 1.0, &[(TEMPERATURE, 1)], false),
    // SI derived
    unit("N", 1.0, FORCE, true),
    unit("J", 1.0, ENERGY, true),
    unit("W", 1.0, POWER, true),
    unit("Pa", 1.0, PRESSURE, true),
    unit("Hz", 1.0, &[(TIME, -1)], true),
    unit("C", 1.0, &[(CURRENT, 1), (TIME, 1)], true),
    unit("V", 1.0, &[(MASS, 1), (LENGTH, 2), (TIME, -3), (CURRENT, -1)], true),
    unit("ohm", 1.0, &[(MASS, 1), (LENGTH, 2), (TIME, -3), (CURRENT, -2)], true),
    unit("L", 1e-3, VOLUME, true),
    unit("l", 1e-3, VOLUME, true),
    unit("M", 1e3, &[(AMOUNT, 1), (LENGTH, -3)], true),
    // Energy and pressure
    unit("eV", 1.602_176_634e-19, ENERGY, true),
    unit("cal", 4.184, ENERGY, true),
    unit("bar", 1e5, PRESSURE, true),
    unit("atm", 101_325.0, PRESSURE, false),
    unit("torr", 101_325.0 / 760.0, PRESSURE, false),
    unit("Torr", 101_325.0 / 760.0, PRESSURE, false),
    unit("mmHg", 133.322_387_415, PRESSURE, false),
    unit("psi", 6_894.757_293_168_361, PRESSURE, false),
    // Time
    unit("min", 60.0, &[(TIME, 1)], false),
    unit("h", 3_600.0, &[(TIME, 1)], false),
    unit("hr", 3_600.0, &[(TIME, 1)], false),
    unit("hour", 3_600.0, &[(TIME, 1)], false),
    unit("day", 86_400.0, &[(TIME, 1)], false),
    unit("week", 604_800.0, &[(TIME, 1)], false),
    // Customary length and mass
    unit("angstrom", 1e-10, &[(LENGTH, 1)], false),
    unit("in", 0.0254, &[(LENGTH, 1)], false),
    unit("ft", 0.3048, &[(LENGTH, 1)], false),
    unit("mi", 1_609.344, &[(LENGTH, 1)], false),
    unit("lb", 0.453_592_37, &[(MASS, 1)], false),
];

/// Metric prefixes, longest symbols first.
const PREFIXES: &[(&str, i32)] = &[
    ("da", 1),
    ("Y", 24),
    ("Z", 21),
    ("E", 18),
    ("P", 15),
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("h", 2),
    ("d", -1),
    ("c", -2),
    ("m", -3),
    ("µ", -6),
    ("u", -6),
    ("n", -9),
    ("p", -12),
    ("f", -15),
    ("a", -18),
    ("z", -21),
    ("y", -24),
];

fn lookup(symbol: &str) -> Option<&'static UnitDefinition> {
    UNITS.iter().find(|u| u.symbol == symbol)
}

/// Parsed form of a unit string.
#[derive(Debug, Clone, PartialEq)]
enum UnitExpr {
    Number(f64),
    Name(String),
    Product(Box<UnitExpr>, Box<UnitExpr>),
    Quotient(Box<UnitExpr>, Box<UnitExpr>),
    Power(Box<UnitExpr>, i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitOp {
    Product,
    Quotient,
}

fn ws<'a, P, O>(inner: P) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn unit_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn integer(input: &str) -> IResult<&str, i32> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), str::parse::<i32>).parse(input)
}

fn exponent(input: &str) -> IResult<&str, i32> {
    alt((integer, delimited(ws(char('(')), integer, ws(char(')'))))).parse(input)
}

fn atom(input: &str) -> IResult<&str, UnitExpr> {
    alt((
        map(map_res(unsigned_literal, str::parse::<f64>), UnitExpr::Number),
        map(unit_name, |name| UnitExpr::Name(name.to_string())),
        delimited(ws(char('(')), product, ws(char(')'))),
    ))
    .parse(input)
}

fn power(input: &str) -> IResult<&str, UnitExpr> {
    let (input, base) = atom(input)?;
    let (input, exp) = opt(preceded(ws(alt((tag("**"), tag("^")))), exponent)).parse(input)?;

    Ok(match exp {
        Some(exp) => (input, UnitExpr::Power(Box::new(base), exp)),
        None => (input, base),
    })
}

fn operator(input: &str) -> IResult<&str, UnitOp> {
    alt((
        value(UnitOp::Product, ws(terminated(char('*'), not(char('*'))))),
        value(UnitOp::Quotient, ws(char('/'))),
        value(
            UnitOp::Product,
            terminated(
                multispace1,
                peek(satisfy(|c| c.is_alphanumeric() || c == '_' || c == '(' || c == '.')),
            ),
        ),
    ))
    .parse(input)
}

fn product(input: &str) -> IResult<&str, UnitExpr> {
    let (mut input, mut left) = power(input)?;

    while let Ok((rest, op)) = operator(input) {
        let (rest, right) = power(rest)?;
        input = rest;
        left = match op {
            UnitOp::Product => UnitExpr::Product(Box::new(left), Box::new(right)),
            UnitOp::Quotient => UnitExpr::Quotient(Box::new(left), Box::new(right)),
        };
    }

    Ok((input, left))
}

fn parse_units(expression: &str) -> Result<UnitExpr, BackendError> {
    all_consuming(ws(product))
        .parse(expression)
        .map(|(_, parsed)| parsed)
        .map_err(|e| BackendError::Malformed {
            expression: expression.to_string(),
            message: e.to_string(),
        })
}

/// Built-in SI conversion backend.
#[derive(Debug, Default)]
pub struct SiBackend {
    custom: CustomUnitRegistry,
}

impl SiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&self, name: &str) -> Result<Dimensioned, BackendError> {
        if self.custom.contains(name) {
            return Ok(Dimensioned::from_exponents(1.0, &[(name, 1)]));
        }

        if let Some(definition) = lookup(name) {
            return Ok(Dimensioned::from_exponents(definition.factor, definition.dimension));
        }

        for (symbol, exponent) in PREFIXES {
            let Some(base) = name.strip_prefix(symbol) else {
                continue;
            };
            if let Some(definition) = lookup(base).filter(|d| d.prefixable) {
                let factor = definition.factor * 10f64.powi(*exponent);
                return Ok(Dimensioned::from_exponents(factor, definition.dimension));
            }
        }

        Err(BackendError::UnknownUnit(name.to_string()))
    }

    fn evaluate(&self, expr: &UnitExpr) -> Result<Dimensioned, BackendError> {
        Ok(match expr {
            UnitExpr::Number(n) => Dimensioned::scalar(*n),
            UnitExpr::Name(name) => self.resolve(name)?,
            UnitExpr::Product(l, r) => self.evaluate(l)?.multiply(&self.evaluate(r)?),
            UnitExpr::Quotient(l, r) => self.evaluate(l)?.divide(&self.evaluate(r)?),
            UnitExpr::Power(base, n) => self.evaluate(base)?.powi(*n),
        })
    }

    /// Parses and resolves a unit string.
    pub fn quantity(&self, units: &str) -> Result<Dimensioned, BackendError> {
        let parsed = parse_units(units)?;
        trace!("Parsed units '{}' as {:?}", units, parsed);
        self.evaluate(&parsed)
    }
}

impl UnitBackend for SiBackend {
    fn register_custom_unit(&self, token: &str) {
        self.custom.register(token);
    }

    fn convert(&self, from: &str, to: &str) -> Result<f64, BackendError> {
        let source = self.quantity(from)?;
        let target = self.quantity(to)?;

        if source.dimension != target.dimension {
            return Err(BackendError::IncompatibleDimensions {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        Ok(source.factor / target.factor)
    }
}
