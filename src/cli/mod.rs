//! Command-line parsing for `unifit`.
//!
//! Argument parsing and command dispatch stay separate from the registry,
//! finalizer and backends; `app` turns these structs into library calls.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Mode;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "unifit",
    version,
    about = "Unified model specifications: one set of argument names, many engines"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List model types, their engines and argument translations.
    Engines(EnginesArgs),
    /// Print a specification and the native call it finalizes to.
    Translate(TranslateArgs),
    /// List the varying (unresolved) arguments of a specification.
    ///
    /// Exits with code 3 when any argument is still `tune()`.
    Check(SpecArgs),
    /// Fit a specification with one or more engines and report in-sample quality.
    Fit(FitArgs),
}

#[derive(Debug, Args, Clone)]
pub struct EnginesArgs {
    /// Only show this model type.
    #[arg(long)]
    pub model: Option<String>,
}

/// How a specification is assembled on the command line.
///
/// Flags are applied on top of `--spec` in this order: mode, canonical
/// arguments, engine arguments, placeholder fills.
#[derive(Debug, Args, Clone)]
pub struct SpecArgs {
    /// Model type, e.g. `rand_forest` or `linear_reg`.
    #[arg(short = 'm', long, required_unless_present = "spec")]
    pub model: Option<String>,

    /// Start from a spec JSON file.
    #[arg(long, value_name = "JSON")]
    pub spec: Option<PathBuf>,

    /// Task mode (defaults to the model type's catalog default).
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Canonical argument, e.g. `--arg trees=2000` or `--arg mtry=tune()`.
    #[arg(short = 'a', long = "arg", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub args: Vec<(String, String)>,

    /// Engine-native argument, e.g. `--engine-arg seed=63233`.
    #[arg(long = "engine-arg", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub engine_args: Vec<(String, String)>,

    /// Fill a `tune()` placeholder with a concrete value.
    #[arg(long = "fill", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub fills: Vec<(String, String)>,
}

#[derive(Debug, Args, Clone)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Engine to translate for (defaults to the model type's default engine).
    #[arg(short = 'e', long)]
    pub engine: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    /// Engine(s) to fit; repeat to compare engines in parallel.
    #[arg(short = 'e', long = "engine")]
    pub engines: Vec<String>,

    /// Training data CSV.
    #[arg(long, value_name = "CSV", requires = "outcome")]
    pub data: Option<PathBuf>,

    /// Outcome column in `--data`.
    #[arg(long)]
    pub outcome: Option<String>,

    /// Rows of synthetic data to generate when no `--data` is given.
    #[arg(short = 'n', long, default_value_t = 200, conflicts_with = "data")]
    pub sample_count: usize,

    /// Feature count of the synthetic data.
    #[arg(long, default_value_t = 4, conflicts_with = "data")]
    pub features: usize,

    /// Random seed for the synthetic data.
    #[arg(long, default_value_t = 42, conflicts_with = "data")]
    pub seed: u64,

    /// Noise standard deviation of the synthetic outcome.
    #[arg(long, default_value_t = 0.5, conflicts_with = "data")]
    pub noise: f64,

    /// Export in-sample predictions to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the specification that was fit to JSON.
    #[arg(long = "export-spec", value_name = "JSON")]
    pub export_spec: Option<PathBuf>,
}

/// Parse `NAME=VALUE`; the value may itself contain `=`.
pub fn parse_key_value(text: &str) -> Result<(String, String), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{text}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing argument name in `{text}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
