//! Reporting utilities: in-sample quality and formatted terminal output.

pub mod format;

pub use format::*;

use crate::data::Dataset;
use crate::error::AppError;
use crate::fit::ModelHandle;

/// In-sample error of a fitted model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Rmse(f64),
    /// Fraction of rows whose predicted class matches the observed one.
    Accuracy(f64),
}

/// Predictions and in-sample metric for one fitted engine.
#[derive(Debug, Clone)]
pub struct FitQuality {
    pub predicted: Vec<f64>,
    pub metric: Metric,
}

/// Predict on the training data and score the result.
pub fn in_sample_quality(handle: &ModelHandle, data: &Dataset) -> Result<FitQuality, AppError> {
    let predicted = handle
        .predict(data.x())
        .map_err(|e| AppError::new(4, format!("Prediction with '{}' failed: {e:#}", handle.engine())))?;
    if predicted.len() != data.n_rows() || predicted.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(
            4,
            format!("Engine '{}' produced invalid predictions.", handle.engine()),
        ));
    }
    let metric = score(data, &predicted);
    Ok(FitQuality { predicted, metric })
}

fn score(data: &Dataset, predicted: &[f64]) -> Metric {
    let n = data.n_rows().max(1) as f64;
    if data.is_categorical() {
        let hits = data
            .y()
            .iter()
            .zip(predicted)
            .filter(|(obs, pred)| obs == pred)
            .count();
        Metric::Accuracy(hits as f64 / n)
    } else {
        let sse: f64 = data
            .y()
            .iter()
            .zip(predicted)
            .map(|(obs, pred)| (obs - pred).powi(2))
            .sum();
        Metric::Rmse((sse / n).sqrt())
    }
}
