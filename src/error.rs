//! Common errors across the aerocom-rs crate

/// Errors related to temporal resolutions and converting between them
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemporalResolutionError {
    /// The string could not be interpreted as a frequency, either as a canonical
    /// token or a pandas offset alias.
    #[error("Invalid input for ts_type: '{0}'")]
    InvalidTsType(String),

    /// The multiplication factor is zero or exceeds the maximum allowed for its base.
    #[error("Invalid multiplication factor {mulfac} for {base} (must be between 1 and {max})")]
    MulfacOutOfBounds { base: String, mulfac: u32, max: u32 },

    /// The frequency has no representation in the requested dialect (e.g. "native" has no
    /// pandas alias).
    #[error("Frequency {ts_type} has no {dialect} equivalent")]
    NoEquivalent { ts_type: String, dialect: &'static str },

    /// Native resolution does not have a defined period length.
    #[error("Frequency {0} does not represent a fixed number of seconds")]
    UndefinedDuration(String),

    /// Asked for the next finer/coarser frequency where there is none.
    #[error("There is no {direction} frequency than {ts_type}")]
    NoNeighbor { ts_type: String, direction: &'static str },

    /// No combination of base frequency and multiplication factor matched an interval length.
    #[error("Could not find a frequency matching an interval of {0} seconds")]
    NoMatchingFrequency(f64),

    /// A resampling was requested from a coarser to a finer resolution.
    #[error("Cannot resample time-series from {from} to {to}")]
    CannotUpsample { from: String, to: String },

    /// A time index was too short to infer a resolution from.
    #[error("Need at least two distinct timestamps to infer a resolution, got {0}")]
    TooFewTimestamps(usize),
}

impl TemporalResolutionError {
    pub(crate) fn no_equivalent<S: ToString>(ts_type: S, dialect: &'static str) -> Self {
        Self::NoEquivalent { ts_type: ts_type.to_string(), dialect }
    }

    pub(crate) fn no_neighbor<S: ToString>(ts_type: S, direction: &'static str) -> Self {
        Self::NoNeighbor { ts_type: ts_type.to_string(), direction }
    }
}

/// Errors from parsing units or computing conversion factors between them
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitConversionError {
    /// The unit string does not follow the unit grammar.
    #[error("Could not parse unit '{unit}': {reason}")]
    ParseError { unit: String, reason: String },

    /// The unit string parsed but contains a symbol we do not know.
    #[error("Unknown unit symbol '{symbol}' in '{unit}'")]
    UnknownSymbol { unit: String, symbol: String },

    /// The two units describe different physical dimensions.
    #[error("Units '{from}' ({from_dim}) and '{to}' ({to_dim}) are not dimensionally compatible")]
    Incompatible { from: String, to: String, from_dim: String, to_dim: String },

    /// A conversion strategy does not apply to this combination of inputs.
    #[error("{0}")]
    NotApplicable(String),

    /// None of the conversion strategies could convert between the units.
    #[error("Failed to convert unit from {from} to {to}{}", var_suffix(.var_name))]
    NoConversion { from: String, to: String, var_name: Option<String> },
}

fn var_suffix(var_name: &Option<String>) -> String {
    match var_name {
        Some(v) => format!(" (variable {v})"),
        None => String::new(),
    }
}

impl UnitConversionError {
    pub(crate) fn parse_error<U: ToString, R: ToString>(unit: U, reason: R) -> Self {
        Self::ParseError { unit: unit.to_string(), reason: reason.to_string() }
    }

    pub(crate) fn not_applicable<S: ToString>(msg: S) -> Self {
        Self::NotApplicable(msg.to_string())
    }
}

/// Errors raised while setting up or running a time resampling
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResampleError {
    /// Input data was missing or of the wrong shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The `min_num_obs` or `how` setting could not be interpreted.
    #[error("Invalid resampling constraint: {0}")]
    InvalidConstraint(String),

    /// The target frequency cannot be handled by the single step resampling.
    #[error("Resampling to {0} is not supported")]
    UnsupportedFrequency(String),

    /// An error in the frequency algebra, see [`TemporalResolutionError`].
    #[error(transparent)]
    Resolution(#[from] TemporalResolutionError),

    /// The resampling configuration could not be loaded.
    #[error("Could not load resampling configuration: {0}")]
    Config(String),
}

impl ResampleError {
    pub(crate) fn invalid_input<S: ToString>(msg: S) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    pub(crate) fn invalid_constraint<S: ToString>(msg: S) -> Self {
        Self::InvalidConstraint(msg.to_string())
    }
}
