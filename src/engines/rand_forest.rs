//! `rand_forest` engines: `ranger` and `randomForest`.
//!
//! Both grow the same bagged CART forest; they differ in argument names and
//! in their defaults.

use anyhow::bail;

use crate::data::Dataset;
use crate::domain::Mode;
use crate::engines::args::NativeArgReader;
use crate::models::forest::{MAX_THREADS, MAX_TREES};
use crate::models::{FittedModel, ForestParams, RandomForest};
use crate::registry::{BackendDescriptor, FitRequest, ModelDefinition};

pub const MODEL_TYPE: &str = "rand_forest";

const DEFAULT_TREES: usize = 500;
/// Fraction of rows per tree when sampling without replacement.
const SUBSAMPLE_FRACTION: f64 = 0.632;

pub fn definition() -> ModelDefinition {
    ModelDefinition::new(MODEL_TYPE, "Random Forest", ["mtry", "trees", "min_n"]).default_engine("ranger")
}

pub fn ranger() -> BackendDescriptor {
    BackendDescriptor::new(MODEL_TYPE, "ranger", fit_ranger)
        .modes([Mode::Regression, Mode::Classification])
        .map_arg("trees", "num.trees")
        .map_arg("mtry", "mtry")
        .map_arg("min_n", "min.node.size")
        .native_args([
            "num.trees",
            "mtry",
            "min.node.size",
            "seed",
            "replace",
            "sample.fraction",
            "num.threads",
        ])
}

pub fn random_forest() -> BackendDescriptor {
    BackendDescriptor::new(MODEL_TYPE, "randomForest", fit_random_forest)
        .modes([Mode::Regression, Mode::Classification])
        .map_arg("trees", "ntree")
        .map_arg("mtry", "mtry")
        .map_arg("min_n", "nodesize")
        .native_args(["ntree", "mtry", "nodesize", "replace", "maxnodes"])
}

fn fit_ranger(req: &FitRequest<'_>) -> anyhow::Result<Box<dyn FittedModel>> {
    let args = NativeArgReader::new("ranger", req.native_args);
    let p = req.data.n_features();
    let replace = args.bool("replace")?.unwrap_or(true);
    let sample_fraction = match args.f64("sample.fraction")? {
        Some(f) if f > 0.0 && f <= 1.0 => f,
        Some(f) => bail!("ranger: 'sample.fraction' must be in (0, 1], got {f}"),
        None => default_fraction(replace),
    };
    let params = ForestParams {
        n_trees: args.usize_at_most("num.trees", MAX_TREES)?.unwrap_or(DEFAULT_TREES),
        mtry: args.usize("mtry")?.unwrap_or_else(|| sqrt_features(p)),
        min_node_size: args
            .usize("min.node.size")?
            .unwrap_or_else(|| default_node_size(req.mode)),
        max_leaf_nodes: None,
        replace,
        sample_fraction,
        seed: args.u64("seed")?,
        num_threads: args.usize_at_most("num.threads", MAX_THREADS)?,
    };
    fit_forest("ranger", req.mode, req.data, params)
}

fn fit_random_forest(req: &FitRequest<'_>) -> anyhow::Result<Box<dyn FittedModel>> {
    let args = NativeArgReader::new("randomForest", req.native_args);
    let p = req.data.n_features();
    let replace = args.bool("replace")?.unwrap_or(true);
    let default_mtry = match req.mode {
        Mode::Regression => (p / 3).max(1),
        _ => sqrt_features(p),
    };
    let params = ForestParams {
        n_trees: args.usize_at_most("ntree", MAX_TREES)?.unwrap_or(DEFAULT_TREES),
        mtry: args.usize("mtry")?.unwrap_or(default_mtry),
        min_node_size: args
            .usize("nodesize")?
            .unwrap_or_else(|| default_node_size(req.mode)),
        max_leaf_nodes: args.usize("maxnodes")?,
        replace,
        sample_fraction: default_fraction(replace),
        seed: None,
        num_threads: None,
    };
    fit_forest("randomForest", req.mode, req.data, params)
}

fn fit_forest(
    engine: &str,
    mode: Mode,
    data: &Dataset,
    params: ForestParams,
) -> anyhow::Result<Box<dyn FittedModel>> {
    log::debug!(
        "{engine}: {} trees, mtry={}, min node size={}",
        params.n_trees,
        params.mtry,
        params.min_node_size
    );
    Ok(Box::new(RandomForest::fit(engine, mode, data, params)?))
}

fn sqrt_features(p: usize) -> usize {
    ((p as f64).sqrt().floor() as usize).max(1)
}

fn default_node_size(mode: Mode) -> usize {
    match mode {
        Mode::Classification => 1,
        _ => 5,
    }
}

fn default_fraction(replace: bool) -> f64 {
    if replace { 1.0 } else { SUBSAMPLE_FRACTION }
}
