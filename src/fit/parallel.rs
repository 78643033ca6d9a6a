//! Independent fits on the rayon pool.

use rayon::prelude::*;

use crate::data::Dataset;
use crate::error::SpecError;
use crate::fit::{ModelHandle, fit};
use crate::registry::Registry;
use crate::spec::ModelSpecification;

/// One unit of work for [`fit_many`].
#[derive(Debug, Clone)]
pub struct FitJob {
    pub spec: ModelSpecification,
    pub engine: String,
}

impl FitJob {
    pub fn new(spec: ModelSpecification, engine: impl Into<String>) -> Self {
        Self {
            spec,
            engine: engine.into(),
        }
    }
}

/// Fit every job against the same data, in parallel.
///
/// Results come back in job order. A failing job only affects its own slot.
pub fn fit_many(
    registry: &Registry,
    jobs: &[FitJob],
    data: &Dataset,
) -> Vec<Result<ModelHandle, SpecError>> {
    log::info!("fitting {} jobs", jobs.len());
    jobs.par_iter()
        .map(|job| fit(registry, &job.spec, data, &job.engine))
        .collect()
}
