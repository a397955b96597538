//! Variable metadata needed by the unit conversion.
//!
//! The only thing the conversion needs to know about a variable is whether it is a
//! rate (a deposition, an emission, or something else accumulated over time). For
//! rate variables, a unit without an explicit time component such as "mg N m-2" is
//! understood to be per sampling period.

/// Source of per-variable metadata.
pub trait VariableInfo {
    /// Whether values of `var_name` are amounts per unit time.
    fn is_rate(&self, var_name: &str) -> bool;
}

/// Name prefixes of deposition variables
pub static DEPOSITION_PREFIXES: &[&str] = &["wet", "dry"];
/// Name prefixes of emission variables
pub static EMISSION_PREFIXES: &[&str] = &["emi"];
/// Rate variables whose names do not follow the prefix convention
pub static DEFAULT_RATE_VARIABLES: &[&str] = &["wdep", "ddep", "pr", "prmm"];

/// Classifies variables as rates from their names.
///
/// Any variable starting with one of [`DEPOSITION_PREFIXES`] or [`EMISSION_PREFIXES`]
/// is a rate, as is anything in the explicit list (which starts as
/// [`DEFAULT_RATE_VARIABLES`] and can be extended).
#[derive(Debug, Clone)]
pub struct VarClassifier {
    rate_variables: Vec<String>,
}

impl VarClassifier {
    pub fn new() -> Self {
        Self {
            rate_variables: DEFAULT_RATE_VARIABLES.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Add variables to the explicit list of rates.
    pub fn with_rate_variables<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for v in vars {
            let v = v.into();
            if !self.rate_variables.contains(&v) {
                self.rate_variables.push(v);
            }
        }
        self
    }

    pub fn is_deposition(&self, var_name: &str) -> bool {
        DEPOSITION_PREFIXES.iter().any(|p| var_name.starts_with(p))
    }

    pub fn is_emission(&self, var_name: &str) -> bool {
        EMISSION_PREFIXES.iter().any(|p| var_name.starts_with(p))
    }
}

impl Default for VarClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableInfo for VarClassifier {
    fn is_rate(&self, var_name: &str) -> bool {
        self.is_deposition(var_name)
            || self.is_emission(var_name)
            || self.rate_variables.iter().any(|v| v == var_name)
    }
}
