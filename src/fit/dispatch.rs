//! Fit dispatch: finalize, then hand the native call to the backend.

use std::time::Instant;

use chrono::{DateTime, Local};
use nalgebra::DMatrix;

use crate::data::Dataset;
use crate::error::SpecError;
use crate::fit::{FinalizedInvocation, finalize};
use crate::models::FittedModel;
use crate::registry::{FitRequest, Registry};
use crate::spec::ModelSpecification;

/// A fitted model together with the call that produced it.
#[derive(Debug)]
pub struct ModelHandle {
    invocation: FinalizedInvocation,
    fitted_at: DateTime<Local>,
    elapsed_ms: u128,
    model: Box<dyn FittedModel>,
}

impl ModelHandle {
    pub fn invocation(&self) -> &FinalizedInvocation {
        &self.invocation
    }

    pub fn engine(&self) -> &str {
        &self.invocation.engine
    }

    pub fn fitted_at(&self) -> DateTime<Local> {
        self.fitted_at
    }

    /// Wall-clock duration of the backend call.
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed_ms
    }

    pub fn model(&self) -> &dyn FittedModel {
        self.model.as_ref()
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> anyhow::Result<Vec<f64>> {
        self.model.predict(x)
    }
}

/// Finalize `spec` for `engine` and fit it on `data`.
///
/// Finalize errors come back unchanged. A backend failure becomes
/// [`SpecError::BackendExecutionError`] carrying the engine name and the
/// backend's full error chain.
pub fn fit(
    registry: &Registry,
    spec: &ModelSpecification,
    data: &Dataset,
    engine: &str,
) -> Result<ModelHandle, SpecError> {
    let invocation = finalize(registry, spec, engine)?;
    let descriptor = registry.lookup(&invocation.model_type, &invocation.engine)?;

    log::info!(
        "fitting {} with engine '{engine}' ({} mode, {} rows x {} features)",
        invocation.model_type,
        invocation.mode,
        data.n_rows(),
        data.n_features()
    );
    let start = Instant::now();
    let request = FitRequest {
        native_args: &invocation.native_args,
        mode: invocation.mode,
        data,
    };
    let result = (descriptor.fit_fn)(&request);
    let elapsed_ms = start.elapsed().as_millis();

    match result {
        Ok(model) => {
            log::info!("engine '{engine}' finished in {elapsed_ms} ms");
            Ok(ModelHandle {
                invocation,
                fitted_at: Local::now(),
                elapsed_ms,
                model,
            })
        }
        Err(err) => {
            log::info!("engine '{engine}' failed after {elapsed_ms} ms");
            Err(SpecError::BackendExecutionError {
                engine: engine.to_string(),
                message: format!("{err:#}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArgValue, Mode, Value};
    use crate::registry::{BackendDescriptor, ModelDefinition};
    use anyhow::Context;

    fn data() -> Dataset {
        let x: Vec<f64> = (0..30).map(|i| f64::from(i) * 0.5).collect();
        let y = x.iter().map(|v| 1.0 + 2.0 * v).collect();
        Dataset::numeric(vec!["x".into()], "y", DMatrix::from_column_slice(30, 1, &x), y).unwrap()
    }

    #[test]
    fn fit_returns_handle_with_invocation() {
        let registry = Registry::with_builtin_engines().unwrap();
        let spec = registry.create("linear_reg").unwrap();
        let handle = fit(&registry, &spec, &data(), "lm").unwrap();
        assert_eq!(handle.engine(), "lm");
        assert_eq!(handle.invocation().mode, Mode::Regression);
        let pred = handle.predict(data().x()).unwrap();
        assert!((pred[2] - 3.0).abs() < 1e-8);
    }

    #[test]
    fn placeholders_fail_before_fitting() {
        let registry = Registry::with_builtin_engines().unwrap();
        let spec = registry
            .create("linear_reg")
            .unwrap()
            .with_arg("penalty", ArgValue::Placeholder)
            .unwrap();
        let err = fit(&registry, &spec, &data(), "glmnet").unwrap_err();
        assert_eq!(
            err,
            SpecError::HasVaryingParameters {
                fields: vec!["penalty".into()],
            }
        );
    }

    #[test]
    fn backend_failure_carries_engine_and_message() {
        let registry = Registry::with_builtin_engines().unwrap();
        let spec = registry.create("linear_reg").unwrap();
        let err = fit(&registry, &spec, &data(), "glmnet").unwrap_err();
        match err {
            SpecError::BackendExecutionError { engine, message } => {
                assert_eq!(engine, "glmnet");
                assert!(message.contains("lambda"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn backend_message(err: SpecError) -> String {
        match err {
            SpecError::BackendExecutionError { engine, message } => {
                assert_eq!(engine, "ranger");
                message
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn oversized_forest_arguments_fail_as_backend_errors() {
        let registry = Registry::with_builtin_engines().unwrap();
        let base = registry.create("rand_forest").unwrap().with_mode(Mode::Regression);

        let spec = base
            .with_arg("trees", ArgValue::Concrete(Value::Int(1)))
            .unwrap()
            .with_engine_arg("sample.fraction", ArgValue::Concrete(Value::Float(1e18)));
        let message = backend_message(fit(&registry, &spec, &data(), "ranger").unwrap_err());
        assert!(message.contains("sample.fraction"), "{message}");

        let spec = base
            .with_arg("trees", ArgValue::Concrete(Value::Int(i64::MAX)))
            .unwrap();
        let message = backend_message(fit(&registry, &spec, &data(), "ranger").unwrap_err());
        assert!(message.contains("num.trees"), "{message}");
    }

    #[test]
    fn backend_context_chain_is_kept() {
        let mut registry = Registry::new();
        registry
            .register_model(ModelDefinition::new("null_model", "Null Model", Vec::<String>::new()))
            .unwrap();
        registry
            .register(
                BackendDescriptor::new("null_model", "broken", |_req| {
                    Err(anyhow::anyhow!("disk full")).context("writing model cache")
                })
                .modes([Mode::Regression]),
            )
            .unwrap();
        let spec = registry.create("null_model").unwrap().with_mode(Mode::Regression);
        let err = fit(&registry, &spec, &data(), "broken").unwrap_err();
        assert_eq!(
            err.to_string(),
            "engine 'broken' failed: writing model cache: disk full"
        );
    }
}
