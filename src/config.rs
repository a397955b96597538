//! Resampling constraints and other user configuration.
//!
//! A configuration file is TOML, for example:
//!
//! ```toml
//! rate_variables = ["fluxco2"]
//!
//! [resampling]
//! how = "median"
//!
//! [resampling.min_num_obs]
//! monthly = { daily = 21 }
//! daily = { hourly = 18 }
//! ```
//!
//! Every section is optional. [`Config::from_toml_str`] and [`Config::from_toml_file`]
//! replace the built-in minimum observation table with the one in the file if there is
//! one, while [`Config::load`] merges the file's entries into the built-in table.
use std::{io::Read, path::Path};

use error_stack::ResultExt;
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use indexmap::IndexMap;
use serde::{de::Error, Deserialize, Serialize};

use crate::error::ResampleError;
use crate::resample::{HowSpec, MinNumObs, ResampleOptions, TimeResampler};
use crate::tstype::TsBase;
use crate::variables::VarClassifier;

/// Minimum numbers of valid observations per resampling step, keyed by the target
/// base and then the source base of the step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinNumObsTable(IndexMap<TsBase, IndexMap<TsBase, u32>>);

impl MinNumObsTable {
    pub fn empty() -> Self {
        Self(IndexMap::new())
    }

    /// The built-in table: 3 months for a year, 7 days for a month, 6 hours for
    /// a day and 15 minutes for an hour.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        table.insert(TsBase::Yearly, TsBase::Monthly, 3);
        table.insert(TsBase::Monthly, TsBase::Daily, 7);
        table.insert(TsBase::Daily, TsBase::Hourly, 6);
        table.insert(TsBase::Hourly, TsBase::Minutely, 15);
        table
    }

    pub fn get(&self, to: TsBase, from: TsBase) -> Option<u32> {
        self.0.get(&to).and_then(|m| m.get(&from)).copied()
    }

    pub fn insert(&mut self, to: TsBase, from: TsBase, min_num_obs: u32) {
        self.0.entry(to).or_default().insert(from, min_num_obs);
    }

    /// Iterate over `(to, from, min_num_obs)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (TsBase, TsBase, u32)> + '_ {
        self.0
            .iter()
            .flat_map(|(to, m)| m.iter().map(move |(from, n)| (*to, *from, *n)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl Default for MinNumObsTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResampleConstraints {
    #[serde(default)]
    pub min_num_obs: MinNumObsTable,
    #[serde(default)]
    pub how: HowSpec,
}

impl ResampleConstraints {
    /// Options for a constrained resampling from `from_ts_type` using these constraints.
    pub fn options(&self, from_ts_type: crate::tstype::TsType) -> ResampleOptions {
        ResampleOptions::new()
            .from_ts_type(from_ts_type)
            .apply_constraints(true)
            .how(self.how.clone())
            .min_num_obs(MinNumObs::PerStep(self.min_num_obs.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub resampling: ResampleConstraints,
    /// Variables to treat as rates in addition to the built-in ones
    #[serde(default)]
    pub rate_variables: Vec<String>,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(p: &Path) -> Result<Self, toml::de::Error> {
        let mut f = std::fs::File::open(p).map_err(|e| {
            toml::de::Error::custom(format!("error opening TOML file {}: {e}", p.display()))
        })?;
        let mut buf = String::new();
        f.read_to_string(&mut buf).map_err(|e| {
            toml::de::Error::custom(format!("error reading TOML file {}: {e}", p.display()))
        })?;
        Self::from_toml_str(&buf)
    }

    /// The built-in configuration with the contents of `path` merged on top of it.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(path))
    }

    /// Load the configuration from `path`, or the built-in one if there is no path.
    pub fn load(path: Option<&Path>) -> error_stack::Result<Self, ResampleError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            error_stack::bail!(ResampleError::Config(format!("{} does not exist", path.display())));
        }

        let config: Config = Self::figment(path)
            .extract()
            .change_context_lazy(|| {
                ResampleError::Config(format!("invalid configuration in {}", path.display()))
            })?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn classifier(&self) -> VarClassifier {
        VarClassifier::new().with_rate_variables(self.rate_variables.iter().cloned())
    }

    pub fn resampler(&self) -> TimeResampler {
        TimeResampler::with_constraints(self.resampling.min_num_obs.clone())
    }
}
