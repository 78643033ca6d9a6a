//! CSV dataset ingest.
//!
//! Turns a header-first CSV into a [`Dataset`]:
//!
//! - one named outcome column (numeric or categorical)
//! - every other column whose cells are all numeric becomes a feature
//! - rows with missing or unparsable cells are skipped and reported

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::data::Dataset;
use crate::error::AppError;

/// How to read the outcome column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutcomeKind {
    /// Numeric if every cell parses as a number, categorical otherwise.
    #[default]
    Auto,
    Numeric,
    Categorical,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the dataset plus what was skipped along the way.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub row_errors: Vec<RowError>,
    /// Non-outcome columns left out because they hold non-numeric text.
    pub ignored_columns: Vec<String>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a dataset from a CSV file.
pub fn load_dataset(path: &Path, outcome: &str, kind: OutcomeKind) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_dataset(file, outcome, kind)
}

/// Load a dataset from any CSV reader.
pub fn read_dataset<R: Read>(input: R, outcome: &str, kind: OutcomeKind) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    let outcome_idx = *header_map
        .get(&normalize_header_name(outcome))
        .ok_or_else(|| AppError::new(2, format!("Missing outcome column: `{outcome}`")))?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;
        match result {
            Ok(record) => records.push((line, record)),
            Err(e) => row_errors.push(RowError {
                line,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }

    let mut feature_idx = Vec::new();
    let mut ignored_columns = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if idx == outcome_idx {
            continue;
        }
        if column_is_numeric(&records, idx) {
            feature_idx.push(idx);
        } else {
            ignored_columns.push(clean_header(name).to_string());
        }
    }
    if feature_idx.is_empty() {
        return Err(AppError::new(2, "CSV has no numeric feature columns."));
    }
    let feature_names: Vec<String> = feature_idx
        .iter()
        .map(|&idx| clean_header(&headers[idx]).to_string())
        .collect();

    let categorical = match kind {
        OutcomeKind::Numeric => false,
        OutcomeKind::Categorical => true,
        OutcomeKind::Auto => !column_is_numeric(&records, outcome_idx),
    };

    let mut values = Vec::with_capacity(records.len() * feature_idx.len());
    let mut numeric_y = Vec::new();
    let mut labels = Vec::new();
    for (line, record) in &records {
        match parse_row(record, &feature_idx, outcome_idx, categorical) {
            Ok((features, outcome)) => {
                values.extend(features);
                match outcome {
                    Outcome::Number(v) => numeric_y.push(v),
                    Outcome::Label(label) => labels.push(label),
                }
            }
            Err(message) => {
                log::debug!("skipping CSV line {line}: {message}");
                row_errors.push(RowError { line: *line, message });
            }
        }
    }

    let rows_used = numeric_y.len() + labels.len();
    if rows_used == 0 {
        return Err(AppError::new(2, "No valid rows remain after parsing the CSV."));
    }
    let x = nalgebra::DMatrix::from_row_slice(rows_used, feature_idx.len(), &values);
    let outcome_name = clean_header(&headers[outcome_idx]).to_string();
    let dataset = if categorical {
        Dataset::categorical(feature_names, outcome_name, x, &labels)?
    } else {
        Dataset::numeric(feature_names, outcome_name, x, numeric_y)?
    };

    row_errors.sort_by_key(|e| e.line);
    Ok(IngestedData {
        dataset,
        row_errors,
        ignored_columns,
        rows_read,
        rows_used,
    })
}

enum Outcome {
    Number(f64),
    Label(String),
}

fn parse_row(
    record: &StringRecord,
    feature_idx: &[usize],
    outcome_idx: usize,
    categorical: bool,
) -> Result<(Vec<f64>, Outcome), String> {
    let mut features = Vec::with_capacity(feature_idx.len());
    for &idx in feature_idx {
        let cell = record.get(idx).unwrap_or("");
        if cell.is_empty() {
            return Err(format!("missing value in column {}", idx + 1));
        }
        let v = parse_number(cell).ok_or_else(|| format!("invalid number '{cell}' in column {}", idx + 1))?;
        features.push(v);
    }

    let cell = record.get(outcome_idx).unwrap_or("");
    if cell.is_empty() {
        return Err("missing outcome".to_string());
    }
    let outcome = if categorical {
        Outcome::Label(cell.to_string())
    } else {
        Outcome::Number(parse_number(cell).ok_or_else(|| format!("invalid outcome '{cell}'"))?)
    };
    Ok((features, outcome))
}

/// True when every non-empty cell of column `idx` is a finite number and at
/// least one cell is present.
fn column_is_numeric(records: &[(usize, StringRecord)], idx: usize) -> bool {
    let mut seen = false;
    for (_, record) in records {
        match record.get(idx) {
            Some("") | None => {}
            Some(cell) => {
                if parse_number(cell).is_none() {
                    return false;
                }
                seen = true;
            }
        }
    }
    seen
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn clean_header(name: &str) -> &str {
    // Excel emits a BOM before the first header.
    name.trim().trim_start_matches('\u{feff}')
}

fn normalize_header_name(name: &str) -> String {
    clean_header(name).to_ascii_lowercase()
}
