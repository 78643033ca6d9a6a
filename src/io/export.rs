//! Export predictions to CSV.
//!
//! One row per (engine, observation), so several engines fit on the same data
//! can be compared in a spreadsheet.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::data::Dataset;
use crate::error::AppError;

/// In-sample predictions of one engine.
#[derive(Debug, Clone)]
pub struct EnginePredictions {
    pub engine: String,
    pub predicted: Vec<f64>,
}

/// Write `engine,row,observed,predicted` rows. Categorical outcomes are
/// written as class labels.
pub fn write_predictions_csv(
    path: &Path,
    data: &Dataset,
    predictions: &[EnginePredictions],
) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_predictions(&mut file, data, predictions)
}

fn write_predictions<W: Write>(
    out: &mut W,
    data: &Dataset,
    predictions: &[EnginePredictions],
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(["engine", "row", "observed", "predicted"])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for p in predictions {
        for (row, (observed, predicted)) in data.y().iter().zip(&p.predicted).enumerate() {
            let record = [
                p.engine.clone(),
                (row + 1).to_string(),
                format_outcome(data, *observed),
                format_outcome(data, *predicted),
            ];
            writer
                .write_record(&record)
                .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
        }
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn format_outcome(data: &Dataset, value: f64) -> String {
    if data.is_categorical() {
        data.class_label(value)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{value}"))
    } else {
        format!("{value:.6}")
    }
}
