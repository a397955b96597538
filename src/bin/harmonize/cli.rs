//! Command line interface definitions
use std::path::PathBuf;

use aerocom_rs::resample::AggregationMethod;
use aerocom_rs::TsType;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Debug, Parser)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub(crate) command: Commands,

    #[command(flatten)]
    pub(crate) verbosity: Verbosity<InfoLevel>,
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Commands {
    /// Print the factor to convert a variable from one unit to another
    Factor(FactorCli),
    /// Show how a temporal resolution string is interpreted
    Tstype(TsTypeCli),
    /// Show the steps a constrained resampling would go through
    Plan(PlanCli),
    /// Resample a time series read from a text file
    Resample(ResampleCli),
}

#[derive(Debug, Clone, Args)]
pub(crate) struct FactorCli {
    /// Variable name, e.g. concso2 or wetoxn
    pub(crate) var_name: String,

    /// Unit to convert from. Quote units containing spaces.
    pub(crate) from_unit: String,

    /// Unit to convert to
    pub(crate) to_unit: String,

    /// Sampling frequency of the data, needed for deposition or emission
    /// units that do not include a time component.
    #[clap(short, long)]
    pub(crate) ts_type: Option<TsType>,

    /// Path to a TOML configuration file with additional rate variables
    #[clap(short, long)]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct TsTypeCli {
    /// A ts_type ("3hourly") or pandas frequency ("3H")
    pub(crate) value: String,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct PlanCli {
    /// Resolution of the input data
    pub(crate) from: TsType,

    /// Resolution to resample to
    pub(crate) to: TsType,

    #[clap(flatten)]
    pub(crate) constraints: ConstraintsCli,

    /// Print the plan as JSON instead of a table
    #[clap(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct ResampleCli {
    /// File with one "TIME VALUE" pair per line, TIME in RFC 3339 format.
    /// Blank lines and lines starting with "#" are skipped.
    pub(crate) file: PathBuf,

    /// Resolution to resample to
    pub(crate) to: TsType,

    /// Resolution of the input data. If not given, it is inferred from the
    /// most common spacing of the timestamps.
    #[clap(short, long)]
    pub(crate) from: Option<TsType>,

    /// Apply minimum observation counts through intermediate resolutions.
    #[clap(long)]
    pub(crate) constraints: bool,

    /// Require this many valid values per output period instead of using the
    /// configured per-step counts. Implies --constraints.
    #[clap(short, long)]
    pub(crate) min_num_obs: Option<u32>,

    #[clap(flatten)]
    pub(crate) config: ConstraintsCli,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct ConstraintsCli {
    /// Path to a TOML configuration file with resampling constraints. Entries
    /// in it are merged into the built-in minimum observation table.
    #[clap(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Aggregation method for every step, e.g. mean, median, max or 75percentile.
    /// Overrides the method in the configuration file.
    #[clap(long)]
    pub(crate) how: Option<AggregationMethod>,
}
