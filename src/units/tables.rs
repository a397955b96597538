//! Fixed data for conversions a dimensional unit system cannot do on its own.
//!
//! Observation files often report mass as the mass of one element (e.g. "ug S/m3",
//! micrograms of sulphur) while the AeroCom default unit is the mass of the whole
//! molecule. Converting between the two needs a ratio of molar masses, which lives
//! in [`CUSTOM_CONVERSIONS`]. [`UNIT_ALIASES`] normalises the free-form spellings
//! found in real data files before any lookup happens.

/// Molar mass of sulphur in g/mol
pub const M_S: f64 = 32.065;
/// Molar mass of oxygen in g/mol
pub const M_O: f64 = 15.9994;
/// Molar mass of nitrogen in g/mol
pub const M_N: f64 = 14.0067;
/// Molar mass of hydrogen in g/mol
pub const M_H: f64 = 1.00794;

pub const M_SO2: f64 = M_S + 2.0 * M_O;
pub const M_SO4: f64 = M_S + 4.0 * M_O;
pub const M_NO2: f64 = M_N + 2.0 * M_O;
pub const M_NH3: f64 = M_N + 3.0 * M_H;

/// Square metres in one hectare
pub const HA_TO_SQM: f64 = 1e4;

/// One entry of the custom conversion table: for variable `var_name`, a value in
/// `from` multiplied by `factor` is a value in `to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomConversion {
    pub var_name: &'static str,
    pub from: &'static str,
    pub to: &'static str,
    pub factor: f64,
}

impl CustomConversion {
    const fn new(
        var_name: &'static str,
        from: &'static str,
        to: &'static str,
        factor: f64,
    ) -> Self {
        Self { var_name, from, to, factor }
    }
}

pub static CUSTOM_CONVERSIONS: &[CustomConversion] = &[
    CustomConversion::new("concso2", "ug S/m3", "ug m-3", M_SO2 / M_S),
    CustomConversion::new("concbc", "ug C/m3", "ug m-3", 1.0),
    CustomConversion::new("concoa", "ug C/m3", "ug m-3", 1.0),
    CustomConversion::new("concoc", "ug C/m3", "ug m-3", 1.0),
    CustomConversion::new("conctc", "ug C/m3", "ug m-3", 1.0),
    // PM ratios are stored against the PM variables with a mass unit
    CustomConversion::new("concpm25", "ug m-3", "1", 1.0),
    CustomConversion::new("concpm10", "ug m-3", "1", 1.0),
    CustomConversion::new("concno2", "ug N/m3", "ug m-3", M_NO2 / M_N),
    CustomConversion::new("concnh3", "ug N/m3", "ug m-3", M_NH3 / M_N),
    CustomConversion::new("wetso4", "kg S/ha", "kg m-2", M_SO4 / M_S / HA_TO_SQM),
    CustomConversion::new("concso4pr", "mg S/L", "g m-3", M_SO4 / M_S),
];

pub static UNIT_ALIASES: &[(&str, &str)] = &[
    // mass concentrations
    ("ug S m-3", "ug S/m3"),
    ("ug C m-3", "ug C/m3"),
    ("ug N m-3", "ug N/m3"),
    ("ugS/m3", "ug S/m3"),
    ("ugC/m3", "ug C/m3"),
    ("ugN/m3", "ug N/m3"),
    ("ug/m3", "ug m-3"),
    // wet deposition and precipitation concentration
    ("kgS/ha", "kg S/ha"),
    ("kg S ha-1", "kg S/ha"),
    ("mgS/L", "mg S/L"),
    ("mg S L-1", "mg S/L"),
    // deposition rates (implicit)
    ("mgS/m2", "mg S m-2"),
    ("mgSm-2", "mg S m-2"),
    ("mgN/m2", "mg N m-2"),
    ("mgNm-2", "mg N m-2"),
    // deposition rates (explicit)
    ("mgS/m2/h", "mg S m-2 h-1"),
    ("mgS/m**2/h", "mg S m-2 h-1"),
    ("mgSm-2h-1", "mg S m-2 h-1"),
    ("mgSm-2d-1", "mg S m-2 d-1"),
    ("mgS/m2/day", "mg S m-2 d-1"),
    ("mgN/m2/h", "mg N m-2 h-1"),
    ("mgNm-2h-1", "mg N m-2 h-1"),
    ("mgNm-2d-1", "mg N m-2 d-1"),
    ("mgN/m2/day", "mg N m-2 d-1"),
    ("mg/m2/h", "mg m-2 h-1"),
    ("mg/m2/day", "mg m-2 d-1"),
    ("g/m2/day", "g m-2 d-1"),
    // velocities
    ("m/s", "m s-1"),
];

/// Replace a unit spelling with its canonical form, if it has one.
pub fn resolve_alias(unit: &str) -> &str {
    UNIT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == unit)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(unit)
}

/// Table entry converting `from` for variable `var_name`, if any.
pub fn lookup_custom(var_name: &str, from: &str) -> Option<&'static CustomConversion> {
    CUSTOM_CONVERSIONS
        .iter()
        .find(|c| c.var_name == var_name && c.from == from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use itertools::Itertools;

    #[test]
    fn test_molar_mass_ratios() {
        assert_relative_eq!(M_SO2 / M_S, 1.9979, epsilon = 1e-4);
        assert_relative_eq!(M_SO4 / M_S, 2.9959, epsilon = 1e-4);
        assert_relative_eq!(M_NO2 / M_N, 3.2845, epsilon = 1e-4);
    }

    #[test]
    fn test_custom_table_is_unique() {
        let keys = CUSTOM_CONVERSIONS.iter().map(|c| (c.var_name, c.from)).collect_vec();
        assert!(keys.iter().all_unique(), "duplicate (var_name, from) keys in custom table");
    }

    #[test]
    fn test_aliases_are_single_step() {
        assert!(UNIT_ALIASES.iter().map(|(a, _)| a).all_unique());
        for (alias, canonical) in UNIT_ALIASES {
            assert_eq!(
                resolve_alias(canonical),
                *canonical,
                "alias target '{canonical}' (from '{alias}') is itself an alias"
            );
        }
    }

    #[test]
    fn test_table_units_parse() {
        for conv in CUSTOM_CONVERSIONS {
            crate::units::Unit::parse(conv.from).unwrap();
            crate::units::Unit::parse(conv.to).unwrap();
        }
        for (_, canonical) in UNIT_ALIASES {
            crate::units::Unit::parse(canonical).unwrap();
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(resolve_alias("ug S m-3"), "ug S/m3");
        assert_eq!(resolve_alias("ug m-3"), "ug m-3");
        let conv = lookup_custom("concso2", "ug S/m3").unwrap();
        assert_eq!(conv.to, "ug m-3");
        assert!(lookup_custom("concso2", "ug S m-3").is_none());
        assert!(lookup_custom("concso4", "ug S/m3").is_none());
    }
}
