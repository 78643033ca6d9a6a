//! Bagged random forests.
//!
//! Each tree is grown on a bootstrap (or subsample) of the rows with `mtry`
//! features tried per split. Trees are independent, so they are grown in
//! parallel; per-tree RNG seeds are drawn up front from the master seed, which
//! keeps a seeded forest identical regardless of thread count.

use anyhow::{Context, bail};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::data::Dataset;
use crate::domain::Mode;
use crate::models::FittedModel;
use crate::models::tree::{Criterion, Tree, TreeParams, majority};

/// Upper bound on the number of trees in one forest.
pub const MAX_TREES: usize = 100_000;
/// Upper bound on a dedicated pool's thread count.
pub const MAX_THREADS: usize = 1024;

/// Fully resolved forest settings (engine defaults already applied).
#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_trees: usize,
    pub mtry: usize,
    pub min_node_size: usize,
    pub max_leaf_nodes: Option<usize>,
    /// Bootstrap with replacement; otherwise subsample without.
    pub replace: bool,
    /// Fraction of rows drawn for each tree.
    pub sample_fraction: f64,
    pub seed: Option<u64>,
    /// Dedicated thread count; the global rayon pool is used when `None`.
    pub num_threads: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    engine: String,
    mode: Mode,
    n_features: usize,
    n_classes: usize,
    params: ForestParams,
    trees: Vec<Tree>,
}

impl RandomForest {
    /// Grow a forest for `mode` (regression or classification) on `data`.
    pub fn fit(engine: &str, mode: Mode, data: &Dataset, params: ForestParams) -> anyhow::Result<Self> {
        let criterion = match mode {
            Mode::Regression => {
                if data.is_categorical() {
                    bail!(
                        "regression requires a numeric outcome, but '{}' is categorical",
                        data.outcome_name()
                    );
                }
                Criterion::Variance
            }
            Mode::Classification => {
                if !data.is_categorical() {
                    bail!(
                        "classification requires a categorical outcome, but '{}' is numeric",
                        data.outcome_name()
                    );
                }
                Criterion::Gini {
                    n_classes: data.classes().len(),
                }
            }
            other => bail!("random forests cannot be fit in {other} mode"),
        };
        validate(&params, data)?;

        let n = data.n_rows();
        let n_sample = ((n as f64 * params.sample_fraction).round() as usize).max(1);
        let tree_params = TreeParams {
            mtry: params.mtry,
            min_node_size: params.min_node_size,
            max_leaf_nodes: params.max_leaf_nodes,
        };

        let mut master = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let seeds: Vec<u64> = (0..params.n_trees).map(|_| master.r#gen()).collect();

        let grow_all = || -> Vec<Tree> {
            seeds
                .par_iter()
                .map(|&seed| {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let rows = draw_rows(&mut rng, n, n_sample, params.replace);
                    Tree::grow(data.x(), data.y(), rows, criterion, tree_params, &mut rng)
                })
                .collect()
        };

        let trees = match params.num_threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .context("failed to build the tree-growing thread pool")?
                .install(grow_all),
            None => grow_all(),
        };

        Ok(Self {
            engine: engine.to_string(),
            mode,
            n_features: data.n_features(),
            n_classes: data.classes().len(),
            params,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        match self.mode {
            Mode::Classification => {
                let mut votes = vec![0.0; self.n_classes.max(1)];
                for tree in &self.trees {
                    if let Some(v) = votes.get_mut(tree.predict_row(x, row) as usize) {
                        *v += 1.0;
                    }
                }
                majority(&votes) as f64
            }
            _ => {
                let sum: f64 = self.trees.iter().map(|t| t.predict_row(x, row)).sum();
                sum / self.trees.len() as f64
            }
        }
    }
}

impl FittedModel for RandomForest {
    fn predict(&self, x: &DMatrix<f64>) -> anyhow::Result<Vec<f64>> {
        if x.ncols() != self.n_features {
            bail!(
                "expected {} feature columns, got {}",
                self.n_features,
                x.ncols()
            );
        }
        Ok((0..x.nrows()).into_par_iter().map(|row| self.predict_row(x, row)).collect())
    }

    fn describe(&self) -> String {
        let leaves: usize = self.trees.iter().map(Tree::n_leaves).sum();
        format!(
            "{} random forest ({}): {} trees, mtry={}, min node size={}, avg leaves={:.1}",
            self.engine,
            self.mode,
            self.trees.len(),
            self.params.mtry,
            self.params.min_node_size,
            leaves as f64 / self.trees.len().max(1) as f64
        )
    }
}

fn validate(params: &ForestParams, data: &Dataset) -> anyhow::Result<()> {
    let p = data.n_features();
    if params.n_trees == 0 {
        bail!("number of trees must be at least 1");
    }
    if params.n_trees > MAX_TREES {
        bail!("number of trees must be at most {MAX_TREES}, got {}", params.n_trees);
    }
    if params.mtry == 0 || params.mtry > p {
        bail!("mtry must be between 1 and the number of features ({p}), got {}", params.mtry);
    }
    if params.min_node_size == 0 {
        bail!("minimum node size must be at least 1");
    }
    if params.max_leaf_nodes == Some(0) {
        bail!("maximum number of terminal nodes must be at least 1");
    }
    if !(params.sample_fraction > 0.0 && params.sample_fraction <= 1.0) {
        bail!("sample fraction must be in (0, 1], got {}", params.sample_fraction);
    }
    match params.num_threads {
        Some(0) => bail!("thread count must be at least 1"),
        Some(n) if n > MAX_THREADS => bail!("thread count must be at most {MAX_THREADS}, got {n}"),
        _ => {}
    }
    Ok(())
}

fn draw_rows<R: Rng>(rng: &mut R, n: usize, n_sample: usize, replace: bool) -> Vec<usize> {
    if replace {
        (0..n_sample).map(|_| rng.gen_range(0..n)).collect()
    } else {
        sample(rng, n, n_sample.min(n)).into_vec()
    }
}
