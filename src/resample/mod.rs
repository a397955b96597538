//! Downsampling of time series to coarser temporal resolutions.
//!
//! The [`TimeResampler`] works in one of three modes per call:
//!
//! - **direct**: when constraints are off or the input resolution is unknown, the data
//!   are aggregated straight to the output frequency with no minimum observation count;
//! - **degenerate**: when input and output resolution are the same, the data are
//!   passed through one aggregation at that frequency;
//! - **hierarchical**: otherwise, the data are aggregated through a sequence of
//!   intermediate frequencies (e.g. hourly, then daily, then monthly), each with its
//!   own minimum number of valid observations, see [`TimeResampler::plan`].
//!
//! Periods that do not reach the required number of observations come out as NaN
//! rather than being dropped.
use std::{fmt::Display, str::FromStr};

use error_stack::ResultExt;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::MinNumObsTable;
use crate::error::ResampleError;
use crate::tstype::{TsBase, TsType};

mod binning;
pub mod labeled;
pub mod series;

pub use labeled::LabeledArray;
pub use series::TimeSeries;

/// How the values within one period are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AggregationMethod {
    #[default]
    Mean,
    Median,
    Sum,
    Min,
    Max,
    /// Sample standard deviation (one delta degree of freedom)
    Std,
    /// Number of valid values
    Count,
    /// The given percentile, with linear interpolation between values
    Percentile(u8),
}

impl AggregationMethod {
    /// Whether the output is in the same unit as the input. Sums and counts are not.
    pub fn preserves_units(&self) -> bool {
        !matches!(self, AggregationMethod::Sum | AggregationMethod::Count)
    }

    /// Aggregate the values of one period, ignoring NaNs.
    ///
    /// Returns NaN if there are fewer than `min_num_obs` valid values, or if there are
    /// none at all (except for [`AggregationMethod::Count`], which gives 0).
    pub fn aggregate(&self, values: &[f64], min_num_obs: u32) -> f64 {
        let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if valid.len() < min_num_obs as usize {
            return f64::NAN;
        }
        if let AggregationMethod::Count = self {
            return valid.len() as f64;
        }
        if valid.is_empty() {
            return f64::NAN;
        }

        let n = valid.len() as f64;
        match self {
            AggregationMethod::Mean => valid.iter().sum::<f64>() / n,
            AggregationMethod::Sum => valid.iter().sum(),
            AggregationMethod::Min => valid.iter().copied().fold(f64::INFINITY, f64::min),
            AggregationMethod::Max => valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggregationMethod::Std => {
                if valid.len() < 2 {
                    return f64::NAN;
                }
                let mean = valid.iter().sum::<f64>() / n;
                let ss: f64 = valid.iter().map(|v| (v - mean).powi(2)).sum();
                (ss / (n - 1.0)).sqrt()
            }
            AggregationMethod::Median => {
                valid.sort_by(|a, b| a.total_cmp(b));
                percentile_sorted(&valid, 50.0)
            }
            AggregationMethod::Percentile(p) => {
                valid.sort_by(|a, b| a.total_cmp(b));
                percentile_sorted(&valid, *p as f64)
            }
            AggregationMethod::Count => valid.len() as f64,
        }
    }
}

fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

impl FromStr for AggregationMethod {
    type Err = ResampleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.trim() {
            "mean" => Self::Mean,
            "median" => Self::Median,
            "sum" => Self::Sum,
            "min" => Self::Min,
            "max" => Self::Max,
            "std" => Self::Std,
            "count" => Self::Count,
            other => other
                .strip_suffix("percentile")
                .and_then(|p| p.parse::<u8>().ok())
                .filter(|p| *p <= 100)
                .map(Self::Percentile)
                .ok_or_else(|| {
                    ResampleError::invalid_constraint(format!("unknown aggregation method '{s}'"))
                })?,
        };
        Ok(method)
    }
}

impl TryFrom<String> for AggregationMethod {
    type Error = ResampleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AggregationMethod> for String {
    fn from(value: AggregationMethod) -> Self {
        value.to_string()
    }
}

impl Display for AggregationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationMethod::Mean => write!(f, "mean"),
            AggregationMethod::Median => write!(f, "median"),
            AggregationMethod::Sum => write!(f, "sum"),
            AggregationMethod::Min => write!(f, "min"),
            AggregationMethod::Max => write!(f, "max"),
            AggregationMethod::Std => write!(f, "std"),
            AggregationMethod::Count => write!(f, "count"),
            AggregationMethod::Percentile(p) => write!(f, "{p}percentile"),
        }
    }
}

/// Aggregation method(s) for a resampling.
///
/// Either one method for every step, or a table of methods keyed by the target and
/// source base of a step (`steps[to][from]`), with a default for steps not listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HowSpec {
    Single(AggregationMethod),
    PerStep {
        #[serde(default)]
        default: AggregationMethod,
        steps: IndexMap<TsBase, IndexMap<TsBase, AggregationMethod>>,
    },
}

impl HowSpec {
    pub fn for_step(&self, to: TsBase, from: TsBase) -> AggregationMethod {
        match self {
            HowSpec::Single(m) => *m,
            HowSpec::PerStep { default, steps } => steps
                .get(&to)
                .and_then(|m| m.get(&from))
                .copied()
                .unwrap_or(*default),
        }
    }

    /// The method used when there is no step to look up.
    pub fn default_method(&self) -> AggregationMethod {
        match self {
            HowSpec::Single(m) => *m,
            HowSpec::PerStep { default, .. } => *default,
        }
    }
}

impl Default for HowSpec {
    fn default() -> Self {
        Self::Single(AggregationMethod::Mean)
    }
}

impl From<AggregationMethod> for HowSpec {
    fn from(value: AggregationMethod) -> Self {
        Self::Single(value)
    }
}

/// Minimum number of valid observations required for an output period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinNumObs {
    /// Applied once, going straight to the output frequency
    Fixed(u32),
    /// Applied per step of a hierarchical resampling
    PerStep(MinNumObsTable),
}

impl From<u32> for MinNumObs {
    fn from(value: u32) -> Self {
        Self::Fixed(value)
    }
}

impl From<MinNumObsTable> for MinNumObs {
    fn from(value: MinNumObsTable) -> Self {
        Self::PerStep(value)
    }
}

/// Per-call options for [`TimeResampler::resample`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResampleOptions {
    /// Resolution of the input, needed for constrained resampling
    pub from_ts_type: Option<TsType>,
    pub how: HowSpec,
    /// Whether to resample hierarchically with minimum observation counts
    pub apply_constraints: bool,
    /// Overrides the resampler's default table when constraints are applied
    pub min_num_obs: Option<MinNumObs>,
}

impl ResampleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ts_type(mut self, ts_type: TsType) -> Self {
        self.from_ts_type = Some(ts_type);
        self
    }

    pub fn how<H: Into<HowSpec>>(mut self, how: H) -> Self {
        self.how = how.into();
        self
    }

    pub fn apply_constraints(mut self, apply: bool) -> Self {
        self.apply_constraints = apply;
        self
    }

    pub fn min_num_obs<M: Into<MinNumObs>>(mut self, min_num_obs: M) -> Self {
        self.min_num_obs = Some(min_num_obs.into());
        self
    }
}

/// One step of a resampling plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, tabled::Tabled)]
pub struct ResamplingStep {
    #[tabled(rename = "To")]
    pub to: TsType,
    #[tabled(rename = "Min. obs.")]
    pub min_num_obs: u32,
    #[tabled(rename = "How")]
    pub how: AggregationMethod,
}

/// The constraints actually used by the last call to [`TimeResampler::resample`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResampleSetup {
    pub apply_constraints: bool,
    pub min_num_obs: Option<MinNumObs>,
}

/// Aggregation of data to one coarser frequency.
///
/// Output periods with fewer than `min_num_obs` valid values must be kept (as NaN),
/// not dropped.
pub trait ResampleOneStep: Sized {
    fn resample_one_step(
        &self,
        freq: &TsType,
        how: AggregationMethod,
        min_num_obs: u32,
    ) -> Result<Self, ResampleError>;
}

/// Data the resampler can work on.
#[derive(Debug, Clone, PartialEq)]
pub enum ResampleData {
    Series(TimeSeries),
    Labeled(LabeledArray),
}

impl ResampleData {
    pub fn times(&self) -> &[chrono::DateTime<chrono::Utc>] {
        match self {
            ResampleData::Series(s) => s.times(),
            ResampleData::Labeled(a) => a.times(),
        }
    }

    pub fn as_series(&self) -> Option<&TimeSeries> {
        match self {
            ResampleData::Series(s) => Some(s),
            ResampleData::Labeled(_) => None,
        }
    }

    pub fn as_labeled(&self) -> Option<&LabeledArray> {
        match self {
            ResampleData::Series(_) => None,
            ResampleData::Labeled(a) => Some(a),
        }
    }

    pub fn into_series(self) -> Option<TimeSeries> {
        match self {
            ResampleData::Series(s) => Some(s),
            ResampleData::Labeled(_) => None,
        }
    }

    pub fn into_labeled(self) -> Option<LabeledArray> {
        match self {
            ResampleData::Series(_) => None,
            ResampleData::Labeled(a) => Some(a),
        }
    }
}

impl ResampleOneStep for ResampleData {
    fn resample_one_step(
        &self,
        freq: &TsType,
        how: AggregationMethod,
        min_num_obs: u32,
    ) -> Result<Self, ResampleError> {
        match self {
            ResampleData::Series(s) => {
                s.resample_one_step(freq, how, min_num_obs).map(Self::Series)
            }
            ResampleData::Labeled(a) => {
                a.resample_one_step(freq, how, min_num_obs).map(Self::Labeled)
            }
        }
    }
}

impl From<TimeSeries> for ResampleData {
    fn from(value: TimeSeries) -> Self {
        Self::Series(value)
    }
}

impl From<LabeledArray> for ResampleData {
    fn from(value: LabeledArray) -> Self {
        Self::Labeled(value)
    }
}

/// Resamples time series to coarser resolutions, see the [module documentation](self).
#[derive(Debug, Clone)]
pub struct TimeResampler {
    input_data: Option<ResampleData>,
    default_min_num_obs: MinNumObsTable,
    last_setup: Option<ResampleSetup>,
    last_units_preserved: bool,
}

impl Default for TimeResampler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeResampler {
    /// A resampler using the built-in minimum observation table.
    pub fn new() -> Self {
        Self::with_constraints(MinNumObsTable::default())
    }

    /// A resampler using `min_num_obs` whenever constraints are applied without
    /// an explicit table.
    pub fn with_constraints(min_num_obs: MinNumObsTable) -> Self {
        Self {
            input_data: None,
            default_min_num_obs: min_num_obs,
            last_setup: None,
            last_units_preserved: true,
        }
    }

    pub fn input_data(&self) -> Option<&ResampleData> {
        self.input_data.as_ref()
    }

    pub fn set_input_data<D: Into<ResampleData>>(&mut self, data: D) {
        self.input_data = Some(data.into());
    }

    pub fn default_min_num_obs(&self) -> &MinNumObsTable {
        &self.default_min_num_obs
    }

    pub fn last_setup(&self) -> Option<&ResampleSetup> {
        self.last_setup.as_ref()
    }

    /// `false` if the last resampling used an aggregation that changes units.
    pub fn last_units_preserved(&self) -> bool {
        self.last_units_preserved
    }

    /// The steps needed to go from `from` to `to` under the given constraints.
    ///
    /// With a table of minimum counts, the canonical bases after `from`'s base up to and
    /// including `to`'s base are walked in order. Each base that has an entry for the
    /// last base stepped to becomes a step. The last step always lands on `to` itself,
    /// with a count of 0 if the table did not provide one. The multiplication factor of
    /// `from` does not take part in this.
    ///
    /// With a fixed count, there is a single step to `to`.
    pub fn plan(
        &self,
        from: &TsType,
        to: &TsType,
        min_num_obs: &MinNumObs,
        how: &HowSpec,
    ) -> Result<Vec<ResamplingStep>, ResampleError> {
        let from_idx = from
            .base()
            .canonical_index()
            .ok_or_else(|| ResampleError::UnsupportedFrequency(from.to_string()))?;
        let to_idx = to
            .base()
            .canonical_index()
            .ok_or_else(|| ResampleError::UnsupportedFrequency(to.to_string()))?;
        if to.partial_cmp(from) == Some(std::cmp::Ordering::Less) {
            return Err(cannot_upsample(from, to));
        }

        let table = match min_num_obs {
            MinNumObs::Fixed(n) => {
                return Ok(vec![ResamplingStep {
                    to: *to,
                    min_num_obs: *n,
                    how: how.for_step(to.base(), from.base()),
                }])
            }
            MinNumObs::PerStep(table) => table,
        };

        if from.mulfac() != 1 {
            log::warn!(
                "Ignoring multiplication factor {} of input frequency {from} when planning steps",
                from.mulfac()
            );
        }

        // A coarser target can still have a finer base (weekly to 10daily), in which
        // case there are no intermediate bases to walk.
        let walk: &[TsBase] = if to_idx > from_idx {
            &TsBase::canonical()[from_idx + 1..=to_idx]
        } else {
            &[]
        };

        let mut steps = vec![];
        let mut last_from = from.base();
        for &target in walk {
            if let Some(n) = table.get(target, last_from) {
                steps.push(ResamplingStep {
                    to: TsType::from(target),
                    min_num_obs: n,
                    how: how.for_step(target, last_from),
                });
                last_from = target;
            }
        }

        match steps.last_mut() {
            Some(last) if last.to.base() == to.base() => last.to = *to,
            _ => steps.push(ResamplingStep {
                to: *to,
                min_num_obs: 0,
                how: how.for_step(to.base(), last_from),
            }),
        }

        Ok(steps)
    }

    /// Resample to `to_ts_type`.
    ///
    /// If `input_data` is given, it replaces the resampler's stored input. The output is
    /// the same kind of data as the input.
    pub fn resample(
        &mut self,
        to_ts_type: &TsType,
        input_data: Option<ResampleData>,
        opts: &ResampleOptions,
    ) -> error_stack::Result<ResampleData, ResampleError> {
        if let Some(data) = input_data {
            self.input_data = Some(data);
        }
        let Some(data) = self.input_data.as_ref() else {
            error_stack::bail!(ResampleError::invalid_input("need a TimeSeries or LabeledArray"));
        };

        if to_ts_type.to_pandas_freq().is_err() {
            error_stack::bail!(ResampleError::UnsupportedFrequency(to_ts_type.to_string()));
        }

        let from_ts_type = match opts.from_ts_type {
            Some(from) if to_ts_type.partial_cmp(&from) == Some(std::cmp::Ordering::Less) => {
                error_stack::bail!(cannot_upsample(&from, to_ts_type));
            }
            Some(from) if opts.apply_constraints => from,
            _ => {
                let how = opts.how.default_method();
                log::debug!("Resampling directly to {to_ts_type} with {how}");
                let result = data.resample_one_step(to_ts_type, how, 0);
                return self.finish_single(result, how);
            }
        };

        if *to_ts_type == from_ts_type {
            let how = opts.how.default_method();
            log::info!("Input is already at {to_ts_type}, only normalising the time index");
            let result = data.resample_one_step(to_ts_type, how, 0);
            return self.finish_single(result, how);
        }

        let min_num_obs = opts
            .min_num_obs
            .clone()
            .unwrap_or_else(|| MinNumObs::PerStep(self.default_min_num_obs.clone()));
        let steps = self
            .plan(&from_ts_type, to_ts_type, &min_num_obs, &opts.how)
            .attach_printable_lazy(|| {
                format!("while planning resampling from {from_ts_type} to {to_ts_type}")
            })?;

        let mut current: Option<ResampleData> = None;
        for step in steps.iter() {
            log::debug!(
                "Resampling to {} with {} (min. {} valid observations)",
                step.to,
                step.how,
                step.min_num_obs
            );
            let input = current.as_ref().unwrap_or(data);
            let output = input
                .resample_one_step(&step.to, step.how, step.min_num_obs)
                .attach_printable_lazy(|| format!("in the resampling step to {}", step.to))?;
            current = Some(output);
        }

        self.last_setup = Some(ResampleSetup {
            apply_constraints: true,
            min_num_obs: Some(min_num_obs),
        });
        self.last_units_preserved = steps.iter().all(|s| s.how.preserves_units());
        // plan() always returns at least the step to the output frequency
        current.ok_or_else(|| {
            error_stack::Report::new(ResampleError::invalid_input("empty resampling plan"))
        })
    }

    fn finish_single(
        &mut self,
        result: Result<ResampleData, ResampleError>,
        how: AggregationMethod,
    ) -> error_stack::Result<ResampleData, ResampleError> {
        let output = result?;
        self.last_setup = Some(ResampleSetup {
            apply_constraints: false,
            min_num_obs: None,
        });
        self.last_units_preserved = how.preserves_units();
        Ok(output)
    }
}

fn cannot_upsample(from: &TsType, to: &TsType) -> ResampleError {
    ResampleError::Resolution(crate::error::TemporalResolutionError::CannotUpsample {
        from: from.to_string(),
        to: to.to_string(),
    })
}
