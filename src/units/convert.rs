//! Conversion factors between units, with fallbacks for the cases that a purely
//! dimensional approach cannot handle.
//!
//! [`UnitConverter`] tries an ordered list of [`ConversionStrategy`]s and returns the
//! first factor any of them produces:
//!
//! 1. [`ConversionStrategy::Dimensional`]: parse both units and compare dimensions.
//! 2. [`ConversionStrategy::CustomTable`]: for a known variable, convert through an
//!    entry of the molar-mass table in [`crate::units::tables`] (in either direction).
//! 3. [`ConversionStrategy::RateImplicit`]: for rate variables whose unit has no time
//!    component (e.g. "mg N m-2"), append the sampling frequency ("mg N m-2 h-1") and
//!    retry the first two strategies.
//!
//! Unit strings are passed through the alias table before any of this happens.
use std::{fmt::Display, sync::OnceLock};

use ndarray::{ArrayBase, DataMut, Dimension};
use num_traits::Float;

use crate::error::UnitConversionError;
use crate::tstype::TsType;
use crate::variables::{VarClassifier, VariableInfo};

use super::{dimensional_conversion_fac, TIME_SYMBOLS};
use super::tables::{lookup_custom, resolve_alias, CUSTOM_CONVERSIONS};

/// Time unit symbols recognised at the end of an explicit rate unit. These are the
/// same symbols the unit parser reads as a time.
pub fn si_freq_tokens() -> impl Iterator<Item = &'static str> {
    std::iter::once("s").chain(TIME_SYMBOLS.iter().map(|(sym, _)| *sym))
}

static DEFAULT_CONVERTER: OnceLock<UnitConverter> = OnceLock::new();

/// One way of finding a conversion factor, see the [module documentation](self).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStrategy {
    Dimensional,
    CustomTable,
    RateImplicit,
}

impl Display for ConversionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConversionStrategy::Dimensional => "dimensional",
            ConversionStrategy::CustomTable => "custom table",
            ConversionStrategy::RateImplicit => "implicit rate",
        };
        write!(f, "{s}")
    }
}

/// Computes unit conversion factors, optionally taking the variable and its
/// sampling frequency into account.
#[derive(Debug, Clone)]
pub struct UnitConverter<V: VariableInfo = VarClassifier> {
    variables: V,
    strategies: Vec<ConversionStrategy>,
}

impl UnitConverter<VarClassifier> {
    pub fn new() -> Self {
        Self::with_variables(VarClassifier::default())
    }
}

impl Default for UnitConverter<VarClassifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VariableInfo> UnitConverter<V> {
    pub fn with_variables(variables: V) -> Self {
        Self {
            variables,
            strategies: vec![
                ConversionStrategy::Dimensional,
                ConversionStrategy::CustomTable,
                ConversionStrategy::RateImplicit,
            ],
        }
    }

    /// Replace the strategies to try, in order.
    pub fn with_strategies(mut self, strategies: Vec<ConversionStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategies(&self) -> &[ConversionStrategy] {
        &self.strategies
    }

    /// Factor to multiply values in `from_unit` by to express them in `to_unit`.
    ///
    /// `var_name` enables the custom table and, together with `ts_type`, the
    /// implicit-rate fallback. Identical units always give exactly 1.
    pub fn conversion_fac(
        &self,
        from_unit: &str,
        to_unit: &str,
        var_name: Option<&str>,
        ts_type: Option<&TsType>,
    ) -> Result<f64, UnitConversionError> {
        let from = resolve_alias(from_unit.trim());
        let to = resolve_alias(to_unit.trim());
        if from == to {
            return Ok(1.0);
        }

        for strategy in self.strategies.iter() {
            match self.apply_strategy(*strategy, from, to, var_name, ts_type) {
                Ok(fac) => {
                    log::debug!(
                        "converted '{from}' to '{to}' with the {strategy} strategy, factor = {fac}"
                    );
                    return Ok(fac);
                }
                Err(e) => {
                    log::debug!("{strategy} conversion from '{from}' to '{to}' failed: {e}");
                }
            }
        }

        Err(UnitConversionError::NoConversion {
            from: from_unit.to_string(),
            to: to_unit.to_string(),
            var_name: var_name.map(|v| v.to_string()),
        })
    }

    fn apply_strategy(
        &self,
        strategy: ConversionStrategy,
        from: &str,
        to: &str,
        var_name: Option<&str>,
        ts_type: Option<&TsType>,
    ) -> Result<f64, UnitConversionError> {
        match strategy {
            ConversionStrategy::Dimensional => dimensional_conversion_fac(from, to),
            ConversionStrategy::CustomTable => custom_table_fac(from, to, var_name),
            ConversionStrategy::RateImplicit => self.rate_implicit_fac(from, to, var_name, ts_type),
        }
    }

    fn rate_implicit_fac(
        &self,
        from: &str,
        to: &str,
        var_name: Option<&str>,
        ts_type: Option<&TsType>,
    ) -> Result<f64, UnitConversionError> {
        let (var_name, ts_type) = match (var_name, ts_type) {
            (Some(v), Some(t)) => (v, t),
            _ => {
                return Err(UnitConversionError::not_applicable(
                    "implicit rate conversion needs both a variable name and a ts_type",
                ))
            }
        };

        if !self.variables.is_rate(var_name) {
            return Err(UnitConversionError::not_applicable(format!(
                "{var_name} is not a rate variable"
            )));
        }

        if !rate_unit_implicit(from) {
            return Err(UnitConversionError::not_applicable(format!(
                "unit '{from}' already has an explicit frequency"
            )));
        }

        let freq = ts_type
            .to_si()
            .map_err(|e| UnitConversionError::not_applicable(e.to_string()))?;
        let explicit_from = format!("{from} {freq}-1");
        log::debug!("treating '{from}' as '{explicit_from}' for {ts_type} {var_name}");

        dimensional_conversion_fac(&explicit_from, to)
            .or_else(|_| custom_table_fac(&explicit_from, to, Some(var_name)))
    }
}

/// Convert through the custom table, using a dimensional conversion for the part of
/// the way the table does not cover. Works for entries converting out of `from` as
/// well as entries converting into `to`.
fn custom_table_fac(
    from: &str,
    to: &str,
    var_name: Option<&str>,
) -> Result<f64, UnitConversionError> {
    let var_name = var_name.ok_or_else(|| {
        UnitConversionError::not_applicable("custom conversions need a variable name")
    })?;

    if let Some(entry) = lookup_custom(var_name, from) {
        return Ok(entry.factor * dimensional_conversion_fac(entry.to, to)?);
    }

    let reverse = CUSTOM_CONVERSIONS
        .iter()
        .find(|c| c.var_name == var_name && c.from == to);
    if let Some(entry) = reverse {
        return Ok(dimensional_conversion_fac(from, entry.to)? / entry.factor);
    }

    Err(UnitConversionError::not_applicable(format!(
        "no custom conversion for {var_name} from '{from}' or to '{to}'"
    )))
}

/// Whether a unit lacks a trailing time component ("/d", "h-1", ...).
///
/// This only looks at the spelling of the unit; whether the variable is a rate
/// at all is a separate question.
pub fn rate_unit_implicit(unit: &str) -> bool {
    let unit = unit.trim();
    !si_freq_tokens()
        .any(|f| unit.ends_with(&format!("/{f}")) || unit.ends_with(&format!("{f}-1")))
}

/// Conversion factor using the default [`UnitConverter`].
pub fn get_unit_conversion_fac(
    from_unit: &str,
    to_unit: &str,
    var_name: Option<&str>,
    ts_type: Option<&TsType>,
) -> Result<f64, UnitConversionError> {
    DEFAULT_CONVERTER
        .get_or_init(UnitConverter::new)
        .conversion_fac(from_unit, to_unit, var_name, ts_type)
}

/// Convert `data` in place from `from_unit` to `to_unit`, returning the factor applied.
///
/// The data is left untouched if the factor is exactly 1.
pub fn convert_unit<F: Float>(
    data: &mut [F],
    from_unit: &str,
    to_unit: &str,
    var_name: Option<&str>,
    ts_type: Option<&TsType>,
) -> Result<f64, UnitConversionError> {
    let fac = get_unit_conversion_fac(from_unit, to_unit, var_name, ts_type)?;
    if fac != 1.0 {
        let f = float_factor(fac)?;
        data.iter_mut().for_each(|v| *v = *v * f);
    }
    Ok(fac)
}

/// Same as [`convert_unit`] for an `ndarray` array of any shape.
pub fn convert_unit_array<F, S, D>(
    data: &mut ArrayBase<S, D>,
    from_unit: &str,
    to_unit: &str,
    var_name: Option<&str>,
    ts_type: Option<&TsType>,
) -> Result<f64, UnitConversionError>
where
    F: Float,
    S: DataMut<Elem = F>,
    D: Dimension,
{
    let fac = get_unit_conversion_fac(from_unit, to_unit, var_name, ts_type)?;
    if fac != 1.0 {
        let f = float_factor(fac)?;
        data.mapv_inplace(|v| v * f);
    }
    Ok(fac)
}

fn float_factor<F: Float>(fac: f64) -> Result<F, UnitConversionError> {
    F::from(fac).ok_or_else(|| {
        UnitConversionError::not_applicable(format!(
            "factor {fac} is not representable in the data type"
        ))
    })
}
