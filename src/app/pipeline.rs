//! Shared pipeline logic behind the subcommands.
//!
//! spec assembly -> data (CSV or synthetic) -> parallel fits -> in-sample quality
//!
//! The subcommand handlers in `app` only decide what to print.

use std::collections::BTreeMap;

use crate::cli::{FitArgs, SpecArgs};
use crate::data::{SampleConfig, generate_sample};
use crate::domain::{ArgValue, Mode, Value};
use crate::error::{AppError, SpecError};
use crate::fit::{FitJob, ModelHandle, fit_many};
use crate::io::ingest::{IngestedData, OutcomeKind, load_dataset};
use crate::io::spec_file::read_spec_json;
use crate::registry::Registry;
use crate::report::{FitQuality, in_sample_quality};
use crate::spec::{ModelSpecification, fill_placeholders};

/// Result of fitting one engine.
#[derive(Debug)]
pub enum EngineRun {
    Fitted {
        handle: ModelHandle,
        quality: FitQuality,
    },
    Failed {
        engine: String,
        error: AppError,
    },
}

/// All computed outputs of a single `unifit fit` run.
#[derive(Debug)]
pub struct RunOutput {
    pub spec: ModelSpecification,
    pub ingest: IngestedData,
    pub runs: Vec<EngineRun>,
}

impl RunOutput {
    /// First failure in engine order, if any engine failed.
    pub fn first_error(&self) -> Option<&AppError> {
        self.runs.iter().find_map(|run| match run {
            EngineRun::Failed { error, .. } => Some(error),
            EngineRun::Fitted { .. } => None,
        })
    }
}

/// Assemble a specification from a spec file and/or command-line flags.
pub fn build_spec(registry: &Registry, args: &SpecArgs) -> Result<ModelSpecification, AppError> {
    let mut spec = match (&args.spec, &args.model) {
        (Some(path), model) => {
            let spec = read_spec_json(path, registry)?;
            if let Some(model) = model {
                if model != spec.model_type() {
                    return Err(AppError::new(
                        2,
                        format!(
                            "`--model {model}` does not match model type `{}` in '{}'.",
                            spec.model_type(),
                            path.display()
                        ),
                    ));
                }
            }
            spec
        }
        (None, Some(model)) => registry.create(model)?,
        (None, None) => return Err(AppError::new(2, "Either `--model` or `--spec` is required.")),
    };

    if let Some(mode) = args.mode {
        spec = spec.with_mode(mode);
    }
    for (name, text) in &args.args {
        spec = spec.with_arg(name, parse_cli_arg(text))?;
    }
    for (name, text) in &args.engine_args {
        spec = spec.with_engine_arg(name, parse_cli_arg(text));
    }
    if !args.fills.is_empty() {
        let values: BTreeMap<String, Value> = args
            .fills
            .iter()
            .map(|(name, text)| (name.clone(), Value::parse(text)))
            .collect();
        spec = fill_placeholders(&spec, &values)?;
    }
    log::info!("built {} specification ({} mode)", spec.model_type(), spec.mode());
    Ok(spec)
}

/// `null` on the command line resets an argument to the engine default.
fn parse_cli_arg(text: &str) -> ArgValue {
    if text == "null" {
        ArgValue::UseDefault
    } else {
        ArgValue::parse(text)
    }
}

/// The named engine, or the catalog default for the spec's model type.
pub fn resolve_engine(
    registry: &Registry,
    spec: &ModelSpecification,
    engine: Option<&str>,
) -> Result<String, AppError> {
    match engine {
        Some(engine) => Ok(engine.to_string()),
        None => registry
            .default_engine(spec.model_type())
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::new(
                    2,
                    format!("Model type `{}` has no default engine; pass `--engine`.", spec.model_type()),
                )
            }),
    }
}

/// Load `--data`, or generate a synthetic sample matching the spec's mode.
pub fn load_data(args: &FitArgs, mode: Mode) -> Result<IngestedData, AppError> {
    if let Some(path) = &args.data {
        let outcome = args
            .outcome
            .as_deref()
            .ok_or_else(|| AppError::new(2, "`--data` requires `--outcome`."))?;
        let kind = match mode {
            Mode::Classification => OutcomeKind::Categorical,
            Mode::Regression => OutcomeKind::Numeric,
            _ => OutcomeKind::Auto,
        };
        return load_dataset(path, outcome, kind);
    }

    let config = SampleConfig {
        n_rows: args.sample_count,
        n_features: args.features,
        // An unset mode still needs data; finalize reports the mode problem.
        mode: if mode == Mode::Classification {
            Mode::Classification
        } else {
            Mode::Regression
        },
        seed: args.seed,
        noise: args.noise,
    };
    let dataset = generate_sample(&config)?;
    let rows = dataset.n_rows();
    Ok(IngestedData {
        dataset,
        row_errors: Vec::new(),
        ignored_columns: Vec::new(),
        rows_read: rows,
        rows_used: rows,
    })
}

/// Execute the fit pipeline for every requested engine.
pub fn run_fit(registry: &Registry, args: &FitArgs) -> Result<RunOutput, AppError> {
    let spec = build_spec(registry, &args.spec)?;
    let engines = if args.engines.is_empty() {
        vec![resolve_engine(registry, &spec, None)?]
    } else {
        args.engines.clone()
    };
    let ingest = load_data(args, spec.mode())?;

    let jobs: Vec<FitJob> = engines
        .iter()
        .map(|engine| FitJob::new(spec.clone(), engine.clone()))
        .collect();
    let results = fit_many(registry, &jobs, &ingest.dataset);

    let runs = engines
        .into_iter()
        .zip(results)
        .map(|(engine, result)| match result {
            Ok(handle) => match in_sample_quality(&handle, &ingest.dataset) {
                Ok(quality) => EngineRun::Fitted { handle, quality },
                Err(error) => EngineRun::Failed { engine, error },
            },
            Err(err) => EngineRun::Failed {
                engine,
                error: AppError::from(err),
            },
        })
        .collect();

    Ok(RunOutput { spec, ingest, runs })
}

/// The error `check` exits with when placeholders remain.
pub fn unresolved_error(spec: &ModelSpecification) -> Option<SpecError> {
    let fields = crate::spec::unresolved_fields(spec);
    if fields.is_empty() {
        None
    } else {
        Some(SpecError::HasVaryingParameters {
            fields: fields.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_args(model: &str) -> SpecArgs {
        SpecArgs {
            model: Some(model.to_string()),
            spec: None,
            mode: None,
            args: Vec::new(),
            engine_args: Vec::new(),
            fills: Vec::new(),
        }
    }

    fn fit_args(spec: SpecArgs, engines: &[&str]) -> FitArgs {
        FitArgs {
            spec,
            engines: engines.iter().map(|e| e.to_string()).collect(),
            data: None,
            outcome: None,
            sample_count: 120,
            features: 3,
            seed: 7,
            noise: 0.3,
            export: None,
            export_spec: None,
        }
    }

    #[test]
    fn flags_build_and_fill_a_spec() {
        let registry = Registry::with_builtin_engines().unwrap();
        let mut args = spec_args("rand_forest");
        args.mode = Some(Mode::Regression);
        args.args = vec![
            ("trees".into(), "2000".into()),
            ("mtry".into(), "tune()".into()),
        ];
        args.engine_args = vec![("seed".into(), "63233".into())];
        args.fills = vec![("mtry".into(), "2".into())];

        let spec = build_spec(&registry, &args).unwrap();
        assert_eq!(spec.arg("trees"), Some(&ArgValue::Concrete(Value::Int(2000))));
        assert_eq!(spec.arg("mtry"), Some(&ArgValue::Concrete(Value::Int(2))));
        assert_eq!(spec.engine_arg("seed"), Some(&ArgValue::Concrete(Value::Int(63233))));
        assert!(unresolved_error(&spec).is_none());
    }

    #[test]
    fn unknown_argument_is_an_input_error() {
        let registry = Registry::with_builtin_engines().unwrap();
        let mut args = spec_args("rand_forest");
        args.args = vec![("bogus_name".into(), "1".into())];
        let err = build_spec(&registry, &args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("bogus_name"));
    }

    #[test]
    fn fit_pipeline_compares_engines() {
        let registry = Registry::with_builtin_engines().unwrap();
        let mut spec = spec_args("linear_reg");
        spec.args = vec![("penalty".into(), "0.01".into())];
        let out = run_fit(&registry, &fit_args(spec, &["glmnet", "lm"])).unwrap();

        assert_eq!(out.ingest.rows_used, 120);
        assert!(matches!(out.runs[0], EngineRun::Fitted { .. }));
        // `lm` has no native name for `penalty`.
        match &out.runs[1] {
            EngineRun::Failed { engine, error } => {
                assert_eq!(engine, "lm");
                assert!(error.to_string().contains("penalty"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(out.first_error().map(AppError::exit_code), Some(2));
    }

    #[test]
    fn default_engine_is_used_when_none_given() {
        let registry = Registry::with_builtin_engines().unwrap();
        let mut spec = spec_args("rand_forest");
        spec.mode = Some(Mode::Classification);
        spec.args = vec![("trees".into(), "25".into())];
        let out = run_fit(&registry, &fit_args(spec, &[])).unwrap();
        match &out.runs[0] {
            EngineRun::Fitted { handle, .. } => assert_eq!(handle.engine(), "ranger"),
            other => panic!("expected a fit, got {other:?}"),
        }
        assert!(out.ingest.dataset.is_categorical());
    }
}
