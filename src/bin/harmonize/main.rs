use std::{
    io::{BufRead, BufReader},
    path::Path,
    process::ExitCode,
};

use aerocom_rs::{
    config::Config,
    logging::init_logging,
    resample::{HowSpec, MinNumObs, ResampleData, ResampleOptions, TimeSeries},
    units::UnitConverter,
    TsType,
};
use chrono::{DateTime, Utc};
use clap::Parser;
use error_stack::ResultExt;
use tabled::settings::{Alignment, Style};

mod cli;

fn main() -> ExitCode {
    let clargs = cli::Cli::parse();
    init_logging(clargs.verbosity.log_level_filter());
    if let Err(e) = main_inner(clargs) {
        eprintln!("ERROR: {e:?}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main_inner(clargs: cli::Cli) -> error_stack::Result<(), CliError> {
    match clargs.command {
        cli::Commands::Factor(factor_cli) => print_factor(factor_cli),
        cli::Commands::Tstype(tstype_cli) => print_ts_type(&tstype_cli.value),
        cli::Commands::Plan(plan_cli) => print_plan(plan_cli),
        cli::Commands::Resample(resample_cli) => resample_driver(resample_cli),
    }
}

fn print_factor(cli: cli::FactorCli) -> error_stack::Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    let converter = UnitConverter::with_variables(config.classifier());
    let fac = converter
        .conversion_fac(&cli.from_unit, &cli.to_unit, Some(&cli.var_name), cli.ts_type.as_ref())
        .change_context_lazy(|| {
            CliError::context(format!("Could not get a conversion factor for {}", cli.var_name))
        })?;
    println!("{fac}");
    Ok(())
}

fn print_ts_type(value: &str) -> error_stack::Result<(), CliError> {
    let ts_type: TsType = value
        .parse::<TsType>()
        .change_context_lazy(|| CliError::context(format!("Invalid ts_type '{value}'")))?;

    let or_none = |r: Result<String, _>| r.unwrap_or_else(|_| "-".to_string());
    let mut builder = tabled::builder::Builder::new();
    builder.push_record(["ts_type", &ts_type.to_string()]);
    builder.push_record(["pandas", &or_none(ts_type.to_pandas_freq())]);
    builder.push_record(["numpy", &or_none(ts_type.to_numpy_freq())]);
    builder.push_record(["SI", &or_none(ts_type.to_si())]);
    builder.push_record(["seconds", &or_none(ts_type.num_secs().map(|s| s.to_string()))]);
    builder.push_record(["tolerance", &or_none(ts_type.tol_secs().map(|s| s.to_string()))]);

    let mut table = builder.build();
    table.with(Style::blank()).with(Alignment::left());
    println!("{table}");
    Ok(())
}

fn print_plan(cli: cli::PlanCli) -> error_stack::Result<(), CliError> {
    let config = load_config(cli.constraints.config.as_deref())?;
    let how = how_spec(&config, cli.constraints.how);
    let resampler = config.resampler();
    let min_num_obs = MinNumObs::PerStep(resampler.default_min_num_obs().clone());
    let steps = resampler
        .plan(&cli.from, &cli.to, &min_num_obs, &how)
        .change_context_lazy(|| {
            CliError::context(format!("Could not plan resampling from {} to {}", cli.from, cli.to))
        })?;

    if cli.json {
        let s = serde_json::to_string_pretty(&steps)
            .change_context_lazy(|| CliError::context("Could not serialize the plan"))?;
        println!("{s}");
    } else {
        let mut table = tabled::Table::new(&steps);
        table.with(Style::modern());
        println!("{table}");
    }
    Ok(())
}

fn resample_driver(cli: cli::ResampleCli) -> error_stack::Result<(), CliError> {
    let config = load_config(cli.config.config.as_deref())?;
    let series = read_series(&cli.file)?;

    let from = match cli.from {
        Some(from) => from,
        None => {
            let from = series.infer_ts_type().change_context_lazy(|| {
                CliError::context(format!(
                    "Could not infer the resolution of {}, use --from to give it",
                    cli.file.display()
                ))
            })?;
            log::info!("Inferred input resolution: {from}");
            from
        }
    };

    let mut opts = ResampleOptions::new()
        .from_ts_type(from)
        .how(how_spec(&config, cli.config.how))
        .apply_constraints(cli.constraints || cli.min_num_obs.is_some());
    if let Some(n) = cli.min_num_obs {
        opts = opts.min_num_obs(n);
    }

    let mut resampler = config.resampler();
    let output = resampler
        .resample(&cli.to, Some(ResampleData::Series(series)), &opts)
        .change_context_lazy(|| {
            CliError::context(format!("Could not resample {} to {}", cli.file.display(), cli.to))
        })?;

    if !resampler.last_units_preserved() {
        log::warn!(
            "The aggregation used does not preserve units, the output unit differs from the input"
        );
    }

    let output = output
        .into_series()
        .ok_or_else(|| CliError::context("Resampling a time series did not return a time series"))?;
    for (t, v) in output.iter() {
        println!("{} {v}", t.to_rfc3339());
    }
    Ok(())
}

fn how_spec(config: &Config, how: Option<aerocom_rs::resample::AggregationMethod>) -> HowSpec {
    match how {
        Some(m) => HowSpec::Single(m),
        None => config.resampling.how.clone(),
    }
}

fn load_config(path: Option<&Path>) -> error_stack::Result<Config, CliError> {
    Config::load(path).change_context_lazy(|| CliError::context("Error loading configuration"))
}

fn read_series(path: &Path) -> error_stack::Result<TimeSeries, CliError> {
    let f = std::fs::File::open(path)
        .change_context_lazy(|| CliError::context(format!("Could not open {}", path.display())))?;

    let mut times = vec![];
    let mut values = vec![];
    for (iline, line) in BufReader::new(f).lines().enumerate() {
        let line = line.change_context_lazy(|| {
            CliError::context(format!("Error reading line {} of {}", iline + 1, path.display()))
        })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (t, v) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| CliError::bad_line(path, iline + 1, "expected a time and a value"))?;
        let t: DateTime<Utc> = t
            .parse::<DateTime<Utc>>()
            .change_context_lazy(|| CliError::bad_line(path, iline + 1, "invalid time"))?;
        // allow common missing value spellings
        let v: f64 = match v.trim() {
            "nan" | "NaN" | "NA" | "" => f64::NAN,
            s => s
                .parse::<f64>()
                .change_context_lazy(|| CliError::bad_line(path, iline + 1, "invalid value"))?,
        };
        times.push(t);
        values.push(v);
    }

    log::debug!("Read {} values from {}", values.len(), path.display());
    TimeSeries::new(times, values).change_context_lazy(|| CliError::context("Invalid time series"))
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    /// Indicates a line of the input file could not be parsed.
    #[error("Line {line} of {file}: {reason}")]
    BadLine {
        file: String,
        line: usize,
        reason: String,
    },

    /// Wrapper type used to add information to an inner error.
    #[error("{0}")]
    Context(String),
}

impl CliError {
    fn bad_line<S: ToString>(file: &Path, line: usize, reason: S) -> Self {
        Self::BadLine {
            file: file.display().to_string(),
            line,
            reason: reason.to_string(),
        }
    }

    fn context<S: ToString>(ctx: S) -> Self {
        Self::Context(ctx.to_string())
    }
}
