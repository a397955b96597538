//! Dimensional unit algebra for the unit strings found in observation and model files.
//!
//! A [`Unit`] is a scale factor relative to the SI base units together with a
//! [`Dimension`] (the vector of exponents on the base dimensions). Two units can be
//! converted into each other if and only if their dimensions are identical, in which
//! case the conversion factor is the ratio of their scales.
//!
//! Besides the physical dimensions, the element markers "S", "N" and "C" (as in
//! "ug S m-3", mass of sulphur) are treated as dimensions of their own. Micrograms of
//! sulphur are not micrograms of sulphate, so such units can only be converted through
//! the molar-mass table in [`tables`].
use std::{fmt::Display, ops::Mul};

use pest::{iterators::Pair, Parser};
use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::error::UnitConversionError;

pub mod convert;
pub mod tables;

pub use convert::{
    convert_unit, convert_unit_array, get_unit_conversion_fac, rate_unit_implicit,
    ConversionStrategy, UnitConverter,
};

/// Seconds in a year as defined by udunits (the tropical year).
pub const SECONDS_PER_YEAR: f64 = 3.15569259747e7;

#[derive(pest_derive::Parser)]
#[grammar = "units/unit.pest"]
struct UnitParser;

/// The base dimensions a unit can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum BaseDimension {
    Length,
    Mass,
    Time,
    Amount,
    Temperature,
    /// Mass (or amount) counted as sulphur atoms
    SulphurBasis,
    /// Mass (or amount) counted as nitrogen atoms
    NitrogenBasis,
    /// Mass (or amount) counted as carbon atoms
    CarbonBasis,
}

impl BaseDimension {
    fn symbol(&self) -> &'static str {
        match self {
            BaseDimension::Length => "m",
            BaseDimension::Mass => "kg",
            BaseDimension::Time => "s",
            BaseDimension::Amount => "mol",
            BaseDimension::Temperature => "K",
            BaseDimension::SulphurBasis => "[S]",
            BaseDimension::NitrogenBasis => "[N]",
            BaseDimension::CarbonBasis => "[C]",
        }
    }
}

/// Exponents on each [`BaseDimension`]; all zeros is dimensionless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension([i32; BaseDimension::COUNT]);

impl Dimension {
    pub fn dimensionless() -> Self {
        Self::default()
    }

    pub fn of(base: BaseDimension) -> Self {
        Self::default().with(base, 1)
    }

    fn with(mut self, base: BaseDimension, exponent: i32) -> Self {
        self.0[base as usize] += exponent;
        self
    }

    pub fn exponent(&self, base: BaseDimension) -> i32 {
        self.0[base as usize]
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    pub fn powi(&self, n: i32) -> Self {
        Self(self.0.map(|e| e * n))
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Self) -> Self::Output {
        let mut out = self;
        for (e, r) in out.0.iter_mut().zip(rhs.0) {
            *e += r;
        }
        out
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }

        let parts: Vec<String> = BaseDimension::iter()
            .filter_map(|b| match self.exponent(b) {
                0 => None,
                1 => Some(b.symbol().to_string()),
                e => Some(format!("{}{e}", b.symbol())),
            })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// A parsed unit: a scale relative to SI base units and its dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    scale: f64,
    dim: Dimension,
}

impl Unit {
    pub fn new(scale: f64, dim: Dimension) -> Self {
        Self { scale, dim }
    }

    pub fn dimensionless(scale: f64) -> Self {
        Self::new(scale, Dimension::dimensionless())
    }

    pub fn second() -> Self {
        Self::new(1.0, Dimension::of(BaseDimension::Time))
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    pub fn powi(&self, n: i32) -> Self {
        Self::new(self.scale.powi(n), self.dim.powi(n))
    }

    /// Parse a unit string. Leading/trailing whitespace is ignored and an empty
    /// string is taken to be dimensionless.
    pub fn parse(unit: &str) -> Result<Self, UnitConversionError> {
        let trimmed = unit.trim();
        if trimmed.is_empty() {
            return Ok(Self::dimensionless(1.0));
        }

        let mut pairs = UnitParser::parse(Rule::unit, trimmed)
            .map_err(|e| UnitConversionError::parse_error(unit, e.variant.message()))?;

        let product = pairs
            .next()
            .and_then(|p| p.into_inner().find(|p| p.as_rule() == Rule::product))
            .ok_or_else(|| UnitConversionError::parse_error(unit, "no unit expression found"))?;

        let mut result = Self::dimensionless(1.0);
        let mut dividing = false;
        for pair in product.into_inner() {
            match pair.as_rule() {
                Rule::divide => dividing = true,
                Rule::multiply => dividing = false,
                Rule::term => {
                    let term = eval_term(pair, unit)?;
                    result = if dividing { result * term.powi(-1) } else { result * term };
                    dividing = false;
                }
                _ => {}
            }
        }

        Ok(result)
    }

    pub fn is_convertible(&self, other: &Unit) -> bool {
        self.dim == other.dim
    }

    /// Factor to multiply a value in this unit by to express it in `other`.
    pub fn factor_to(&self, other: &Unit) -> Result<f64, UnitConversionError> {
        if !self.is_convertible(other) {
            return Err(UnitConversionError::Incompatible {
                from: self.to_string(),
                to: other.to_string(),
                from_dim: self.dim.to_string(),
                to_dim: other.dim.to_string(),
            });
        }
        Ok(self.scale / other.scale)
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Self) -> Self::Output {
        Unit::new(self.scale * rhs.scale, self.dim * rhs.dim)
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.dim.is_dimensionless() {
            write!(f, "{}", self.scale)
        } else if self.scale == 1.0 {
            write!(f, "{}", self.dim)
        } else {
            write!(f, "{} {}", self.scale, self.dim)
        }
    }
}

/// Parse two unit strings and compute the factor to go from the first to the second.
pub fn dimensional_conversion_fac(from: &str, to: &str) -> Result<f64, UnitConversionError> {
    let from_unit = Unit::parse(from)?;
    let to_unit = Unit::parse(to)?;
    from_unit.factor_to(&to_unit).map_err(|e| match e {
        UnitConversionError::Incompatible { from_dim, to_dim, .. } => {
            UnitConversionError::Incompatible {
                from: from.to_string(),
                to: to.to_string(),
                from_dim,
                to_dim,
            }
        }
        other => other,
    })
}

fn eval_term(pair: Pair<'_, Rule>, unit: &str) -> Result<Unit, UnitConversionError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| UnitConversionError::parse_error(unit, "empty term"))?;

    match inner.as_rule() {
        Rule::number => {
            let value = inner
                .as_str()
                .parse::<f64>()
                .map_err(|e| UnitConversionError::parse_error(unit, e))?;
            Ok(Unit::dimensionless(value))
        }
        Rule::factor => {
            let mut scale = 1.0;
            let mut base = None;
            let mut exponent = 1;
            for part in inner.into_inner() {
                match part.as_rule() {
                    Rule::scale => {
                        scale = part
                            .as_str()
                            .parse::<f64>()
                            .map_err(|e| UnitConversionError::parse_error(unit, e))?;
                    }
                    Rule::symbol => {
                        let sym = part.as_str();
                        base = Some(lookup_symbol(sym).ok_or_else(|| {
                            UnitConversionError::UnknownSymbol {
                                unit: unit.to_string(),
                                symbol: sym.to_string(),
                            }
                        })?);
                    }
                    Rule::exponent => {
                        let e = part.as_str().trim_start_matches('^').trim_start_matches("**");
                        exponent = e
                            .parse::<i32>()
                            .map_err(|e| UnitConversionError::parse_error(unit, e))?;
                    }
                    _ => {}
                }
            }
            let base = base
                .ok_or_else(|| UnitConversionError::parse_error(unit, "factor without symbol"))?;
            Ok((Unit::dimensionless(scale) * base).powi(exponent))
        }
        _ => Err(UnitConversionError::parse_error(
            unit,
            format!("unexpected token '{}'", inner.as_str()),
        )),
    }
}

/// Resolve a single unit symbol, trying whole symbols before prefixed ones so
/// that e.g. "min", "ha" and "mol" are not read as prefix + unit.
fn lookup_symbol(sym: &str) -> Option<Unit> {
    if let Some(u) = special_symbol(sym).or_else(|| prefixable_symbol(sym)) {
        return Some(u);
    }

    PREFIXES.iter().find_map(|(prefix, fac)| {
        let rest = sym.strip_prefix(prefix)?;
        prefixable_symbol(rest).map(|u| Unit::dimensionless(*fac) * u)
    })
}

/// SI prefixes, two-character ones first so "da" is not read as "d" + "a".
static PREFIXES: &[(&str, f64)] = &[
    ("da", 1e1),
    ("p", 1e-12),
    ("n", 1e-9),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("μ", 1e-6),
    ("m", 1e-3),
    ("c", 1e-2),
    ("d", 1e-1),
    ("h", 1e2),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
];

fn prefixable_symbol(sym: &str) -> Option<Unit> {
    use BaseDimension::*;
    let u = match sym {
        "g" => Unit::new(1e-3, Dimension::of(Mass)),
        "m" => Unit::new(1.0, Dimension::of(Length)),
        "s" => Unit::second(),
        "L" | "l" => Unit::new(1e-3, Dimension::of(Length).powi(3)),
        "mol" => Unit::new(1.0, Dimension::of(Amount)),
        "Pa" => Unit::new(1.0, Dimension::of(Mass).with(Length, -1).with(Time, -2)),
        _ => return None,
    };
    Some(u)
}

/// Time symbols other than the (prefixable) second, with their length in seconds.
pub static TIME_SYMBOLS: &[(&str, f64)] = &[
    ("min", 60.0),
    ("h", 3600.0),
    ("hr", 3600.0),
    ("hour", 3600.0),
    ("d", 86400.0),
    ("day", 86400.0),
    ("week", 7.0 * 86400.0),
    ("month", SECONDS_PER_YEAR / 12.0),
    ("yr", SECONDS_PER_YEAR),
    ("year", SECONDS_PER_YEAR),
];

fn special_symbol(sym: &str) -> Option<Unit> {
    use BaseDimension::*;
    if let Some(&(_, secs)) = TIME_SYMBOLS.iter().find(|(s, _)| *s == sym) {
        return Some(Unit::new(secs, Dimension::of(Time)));
    }
    let u = match sym {
        "ha" => Unit::new(1e4, Dimension::of(Length).powi(2)),
        "t" => Unit::new(1e3, Dimension::of(Mass)),
        "K" => Unit::new(1.0, Dimension::of(Temperature)),
        "%" => Unit::dimensionless(1e-2),
        "ppm" => Unit::dimensionless(1e-6),
        "ppb" => Unit::dimensionless(1e-9),
        "ppt" => Unit::dimensionless(1e-12),
        "S" => Unit::new(1.0, Dimension::of(SulphurBasis)),
        "N" => Unit::new(1.0, Dimension::of(NitrogenBasis)),
        "C" => Unit::new(1.0, Dimension::of(CarbonBasis)),
        _ => return None,
    };
    Some(u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("ug m-3", "ug/m3")]
    #[case("ug m-3", "ug m**-3")]
    #[case("ug m-3", "ug m^-3")]
    #[case("ug m-3", "µg/m3")]
    #[case("mg m-2 d-1", "mg/m2/day")]
    #[case("m s-1", "m/s")]
    #[case("m s-1", "m.s-1")]
    #[case("m s-1", "m*s-1")]
    #[case("kg", "1e3 g")]
    #[case("kg m-2", "  kg   m-2 ")]
    #[case("mg S/L", "mg S L-1")]
    fn test_equivalent_spellings(#[case] a: &str, #[case] b: &str) {
        let ua = Unit::parse(a).unwrap();
        let ub = Unit::parse(b).unwrap();
        assert_eq!(ua.dimension(), ub.dimension(), "{a} vs {b}");
        assert_relative_eq!(ua.scale(), ub.scale(), max_relative = 1e-12);
    }

    #[rstest]
    #[case("ug m-3", "mg m-3", 1e-3)]
    #[case("mg m-3", "ug m-3", 1e3)]
    #[case("kg m-2 s-1", "mg m-2 d-1", 86400.0 * 1e6)]
    #[case("mg m-2 h-1", "mg m-2 d-1", 24.0)]
    #[case("mg L-1", "g m-3", 1.0)]
    #[case("kg/ha", "kg m-2", 1e-4)]
    #[case("hPa", "Pa", 100.0)]
    #[case("%", "1", 0.01)]
    #[case("ppb", "ppm", 1e-3)]
    #[case("mg N m-2 h-1", "mg N m-2 d-1", 24.0)]
    #[case("mg m-2 3h-1", "mg m-2 h-1", 1.0 / 3.0)]
    #[case("1", "", 1.0)]
    fn test_conversion_factors(#[case] from: &str, #[case] to: &str, #[case] expected: f64) {
        let fac = dimensional_conversion_fac(from, to).unwrap();
        assert_relative_eq!(fac, expected, max_relative = 1e-12);
    }

    #[rstest]
    #[case("ug S/m3", "ug m-3")]
    #[case("ug N m-3", "ug m-3")]
    #[case("m", "s")]
    #[case("mg m-2", "mg m-2 d-1")]
    fn test_incompatible(#[case] from: &str, #[case] to: &str) {
        let err = dimensional_conversion_fac(from, to).unwrap_err();
        match err {
            UnitConversionError::Incompatible { from: f, to: t, .. } => {
                assert_eq!(f, from);
                assert_eq!(t, to);
            }
            other => panic!("expected Incompatible, got {other:?}"),
        }
    }

    #[rstest]
    #[case("mgSm-2")]
    #[case("furlong")]
    #[case("ug m-3 xyz")]
    fn test_unknown_symbol(#[case] unit: &str) {
        assert!(matches!(
            Unit::parse(unit).unwrap_err(),
            UnitConversionError::UnknownSymbol { .. }
        ));
    }

    #[rstest]
    #[case("ug m-3 /")]
    #[case("m--3")]
    #[case("(kg)")]
    #[case("1e-6kg")]
    fn test_parse_errors(#[case] unit: &str) {
        assert!(matches!(
            Unit::parse(unit).unwrap_err(),
            UnitConversionError::ParseError { .. }
        ));
    }

    #[test]
    fn test_time_units() {
        let secs = |u: &str| Unit::parse(u).unwrap().factor_to(&Unit::second()).unwrap();
        assert_relative_eq!(secs("month"), SECONDS_PER_YEAR / 12.0);
        assert_relative_eq!(secs("week"), 604800.0);
        assert_relative_eq!(secs("hour"), 3600.0);
        // "d" alone is a day, but "dm" is a decimetre
        assert_eq!(Unit::parse("dm").unwrap().dimension(), Dimension::of(BaseDimension::Length));
        assert_relative_eq!(Unit::parse("mmol").unwrap().scale(), 1e-3);
    }

    #[test]
    fn test_dimension_display() {
        assert_eq!(Unit::parse("ug S m-3").unwrap().dimension().to_string(), "m-3 kg [S]");
        assert_eq!(Unit::parse("1").unwrap().dimension().to_string(), "1");
    }
}
