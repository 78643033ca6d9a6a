//! `linear_reg` engines: `lm` (least squares) and `glmnet` (elastic net).

use crate::domain::Mode;
use crate::engines::args::NativeArgReader;
use crate::models::{ElasticNetParams, FittedModel, LinearModel};
use crate::registry::{BackendDescriptor, FitRequest, ModelDefinition};

pub const MODEL_TYPE: &str = "linear_reg";

pub fn definition() -> ModelDefinition {
    ModelDefinition::new(MODEL_TYPE, "Linear Regression", ["penalty", "mixture"])
        .default_mode(Mode::Regression)
        .default_engine("lm")
}

pub fn lm() -> BackendDescriptor {
    BackendDescriptor::new(MODEL_TYPE, "lm", fit_lm)
        .modes([Mode::Regression])
        .native_args(["tol"])
}

pub fn glmnet() -> BackendDescriptor {
    BackendDescriptor::new(MODEL_TYPE, "glmnet", fit_glmnet)
        .modes([Mode::Regression])
        .map_arg("penalty", "lambda")
        .map_arg("mixture", "alpha")
        .native_args(["lambda", "alpha", "standardize", "maxit", "thresh"])
}

fn fit_lm(req: &FitRequest<'_>) -> anyhow::Result<Box<dyn FittedModel>> {
    let args = NativeArgReader::new("lm", req.native_args);
    let tol = args.f64("tol")?;
    Ok(Box::new(LinearModel::fit_ols("lm", req.data, tol)?))
}

fn fit_glmnet(req: &FitRequest<'_>) -> anyhow::Result<Box<dyn FittedModel>> {
    let args = NativeArgReader::new("glmnet", req.native_args);
    let params = ElasticNetParams {
        lambda: args.required_f64("lambda")?,
        alpha: args.f64("alpha")?.unwrap_or(1.0),
        standardize: args.bool("standardize")?.unwrap_or(true),
        max_iter: args.usize("maxit")?.unwrap_or(100_000),
        tolerance: args.f64("thresh")?.unwrap_or(1e-7),
    };
    Ok(Box::new(LinearModel::fit_elastic_net("glmnet", req.data, params)?))
}
