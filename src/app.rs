//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - builds the registry of built-in engines
//! - runs the requested subcommand and prints its report
//! - writes optional exports

use clap::Parser;
use env_logger::Env;

use crate::cli::{Command, EnginesArgs, FitArgs, SpecArgs, TranslateArgs};
use crate::error::AppError;
use crate::registry::Registry;

pub mod pipeline;

/// Entry point for the `unifit` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; it only supplies RUST_LOG and friends.
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = crate::cli::Cli::parse();
    let registry = Registry::with_builtin_engines()?;

    match cli.command {
        Command::Engines(args) => handle_engines(&registry, &args),
        Command::Translate(args) => handle_translate(&registry, &args),
        Command::Check(args) => handle_check(&registry, &args),
        Command::Fit(args) => handle_fit(&registry, &args),
    }
}

fn handle_engines(registry: &Registry, args: &EnginesArgs) -> Result<(), AppError> {
    if let Some(model) = &args.model {
        registry.model(model)?;
    }
    print!("{}", crate::report::format_engines(registry, args.model.as_deref()));
    Ok(())
}

fn handle_translate(registry: &Registry, args: &TranslateArgs) -> Result<(), AppError> {
    let spec = pipeline::build_spec(registry, &args.spec)?;
    let engine = pipeline::resolve_engine(registry, &spec, args.engine.as_deref())?;

    println!("{}", crate::report::format_spec(registry, &spec, Some(&engine)));
    let invocation = crate::fit::finalize(registry, &spec, &engine)?;
    print!("{}", crate::report::format_invocation(&invocation));
    Ok(())
}

fn handle_check(registry: &Registry, args: &SpecArgs) -> Result<(), AppError> {
    let spec = pipeline::build_spec(registry, args)?;
    print!(
        "{}",
        crate::report::format_unresolved(&crate::spec::unresolved_fields(&spec))
    );
    match pipeline::unresolved_error(&spec) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn handle_fit(registry: &Registry, args: &FitArgs) -> Result<(), AppError> {
    let run = pipeline::run_fit(registry, args)?;

    println!("{}", crate::report::format_spec(registry, &run.spec, None));
    println!("{}", crate::report::format_ingest(&run.ingest));

    let mut predictions = Vec::new();
    for engine_run in &run.runs {
        match engine_run {
            pipeline::EngineRun::Fitted { handle, quality } => {
                print!("{}", crate::report::format_fit_line(handle, quality));
                predictions.push(crate::io::export::EnginePredictions {
                    engine: handle.engine().to_string(),
                    predicted: quality.predicted.clone(),
                });
            }
            pipeline::EngineRun::Failed { engine, error } => {
                print!("{}", crate::report::format_fit_failure(engine, &error.to_string()));
            }
        }
    }

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::export::write_predictions_csv(path, &run.ingest.dataset, &predictions)?;
        log::info!("wrote predictions to {}", path.display());
    }
    if let Some(path) = &args.export_spec {
        crate::io::spec_file::write_spec_json(path, &run.spec)?;
        log::info!("wrote specification to {}", path.display());
    }

    match run.first_error() {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}
