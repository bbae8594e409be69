//! Command-line parsing for the worm-like chain fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::CliOverrides;
use crate::data::SampleConfig;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wlc", version, about = "Worm-like chain force-extension fitter")]
pub struct Cli {
    /// Increase log verbosity (-v info and solver progress, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit one force-extension CSV and print the fit report.
    Fit(FitArgs),
    /// Fit many CSV files in parallel and print one summary line per file.
    Batch(BatchArgs),
    /// Write synthetic Odijk data to CSV.
    Simulate(SimulateArgs),
    /// List the registered models and their default parameters.
    Models,
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
}

/// Model, config and solver options shared by `fit` and `batch`.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Model name (odijk, WLC, bouchiat). Default: odijk, or the config file's model.
    #[arg(short, long)]
    pub model: Option<String>,

    /// TOML config file with [fit], [refine] and [params.<name>] tables.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Relative reduction of chi-square at which the solver stops (ftol).
    #[arg(long)]
    pub min_delta: Option<f64>,

    /// Solver iteration cap.
    #[arg(long)]
    pub max_iters: Option<usize>,

    /// Temperature in degrees Celsius; sets kBT.
    #[arg(short = 'T', long)]
    pub temperature: Option<f64>,

    /// Refine the persistence length until it changes by less than this [nm].
    #[arg(long, value_name = "DELTA_LP")]
    pub refine: Option<f64>,

    /// Maximum refinement rounds (implies refinement).
    #[arg(long)]
    pub max_rounds: Option<usize>,
}

impl ModelArgs {
    pub fn cli_overrides(&self) -> CliOverrides {
        CliOverrides {
            model: self.model.clone(),
            temperature: self.temperature,
            min_delta: self.min_delta,
            max_iters: self.max_iters,
            refine_delta_lp: self.refine,
            max_rounds: self.max_rounds,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Measurement CSV (distance, force[, sigma | weight]).
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Render the data and fitted curve as an ASCII plot.
    #[arg(long)]
    pub plot: bool,

    /// Render the weighted residuals as an ASCII plot.
    #[arg(long)]
    pub residuals: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export curve (model + params + sampled grid) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,

    /// Export data, best fit and residuals to CSV.
    #[arg(long = "export-residuals", value_name = "CSV")]
    pub export_residuals: Option<PathBuf>,

    /// Export the refinement history to CSV.
    #[arg(long = "export-history", value_name = "CSV")]
    pub export_history: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Measurement CSV files.
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Output CSV path.
    #[arg(short, long, value_name = "FILE")]
    pub out: PathBuf,

    /// Contour length [nm].
    #[arg(long, default_value_t = 5000.0)]
    pub lc: f64,

    /// Persistence length [nm].
    #[arg(long, default_value_t = 50.0)]
    pub lp: f64,

    /// Stretch modulus [pN].
    #[arg(long, default_value_t = 1000.0)]
    pub s: f64,

    /// Thermal energy [pN*nm]. Default: kBT at 25 C.
    #[arg(long)]
    pub kbt: Option<f64>,

    /// Standard deviation of the distance noise [um].
    #[arg(long, default_value_t = 0.005)]
    pub noise: f64,

    /// Number of points.
    #[arg(short = 'n', long, default_value_t = 200)]
    pub points: usize,

    /// Lowest force [pN].
    #[arg(long, default_value_t = 1.0)]
    pub f_min: f64,

    /// Highest force [pN].
    #[arg(long, default_value_t = 50.0)]
    pub f_max: f64,

    /// Random seed.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Draw forces uniformly at random instead of on an even grid.
    #[arg(long)]
    pub random_forces: bool,
}

impl SimulateArgs {
    pub fn sample_config(&self) -> SampleConfig {
        let defaults = SampleConfig::default();
        SampleConfig {
            lc: self.lc,
            lp: self.lp,
            s: self.s,
            kbt: self.kbt.unwrap_or(defaults.kbt),
            noise: self.noise,
            points: self.points,
            f_min: self.f_min,
            f_max: self.f_max,
            seed: self.seed,
            random_forces: self.random_forces,
        }
    }
}

/// Options for plotting a saved curve.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Curve JSON file produced by `wlc fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fit_flags_map_to_overrides() {
        let cli = Cli::parse_from([
            "wlc", "-vv", "fit", "--data", "pull.csv", "--model", "WLC", "-T", "22", "--refine", "0.01",
            "--plot",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert!(args.plot);
        assert!(!args.residuals);
        let overrides = args.model.cli_overrides();
        assert_eq!(overrides.model.as_deref(), Some("WLC"));
        assert_eq!(overrides.temperature, Some(22.0));
        assert_eq!(overrides.refine_delta_lp, Some(0.01));
        assert_eq!(overrides.max_iters, None);
    }

    #[test]
    fn simulate_defaults_match_sample_defaults() {
        let cli = Cli::parse_from(["wlc", "simulate", "--out", "x.csv"]);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.sample_config(), SampleConfig::default());
    }

    #[test]
    fn batch_requires_files() {
        assert!(Cli::try_parse_from(["wlc", "batch"]).is_err());
    }
}
