//! In-memory training data handed to backends.
//!
//! The core never looks inside a [`Dataset`]; it is passed through to the
//! selected engine's fit callable unchanged. A categorical outcome is stored
//! as class codes (`0.0`, `1.0`, ...) indexing into `classes`.

use nalgebra::DMatrix;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    outcome_name: String,
    x: DMatrix<f64>,
    y: Vec<f64>,
    classes: Vec<String>,
}

impl Dataset {
    /// Build a dataset with a numeric outcome.
    pub fn numeric(
        feature_names: Vec<String>,
        outcome_name: impl Into<String>,
        x: DMatrix<f64>,
        y: Vec<f64>,
    ) -> Result<Self, AppError> {
        check_shape(&feature_names, &x, y.len())?;
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::new(2, "Dataset contains non-finite values."));
        }
        Ok(Self {
            feature_names,
            outcome_name: outcome_name.into(),
            x,
            y,
            classes: Vec::new(),
        })
    }

    /// Build a dataset with a categorical outcome.
    ///
    /// Classes are ordered lexicographically so the same labels always get the
    /// same codes.
    pub fn categorical(
        feature_names: Vec<String>,
        outcome_name: impl Into<String>,
        x: DMatrix<f64>,
        labels: &[String],
    ) -> Result<Self, AppError> {
        check_shape(&feature_names, &x, labels.len())?;
        if x.iter().any(|v| !v.is_finite()) {
            return Err(AppError::new(2, "Dataset contains non-finite values."));
        }

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();

        let y = labels
            .iter()
            .map(|label| {
                // `classes` was built from `labels`, so the search always succeeds.
                classes.binary_search(label).map(|i| i as f64).unwrap_or(0.0)
            })
            .collect();

        Ok(Self {
            feature_names,
            outcome_name: outcome_name.into(),
            x,
            y,
            classes,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn outcome_name(&self) -> &str {
        &self.outcome_name
    }

    pub fn x(&self) -> &DMatrix<f64> {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Class labels for a categorical outcome; empty for a numeric one.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn is_categorical(&self) -> bool {
        !self.classes.is_empty()
    }

    /// Label for a predicted class code, if it is in range.
    pub fn class_label(&self, code: f64) -> Option<&str> {
        if code < 0.0 || code.fract() != 0.0 {
            return None;
        }
        self.classes.get(code as usize).map(String::as_str)
    }
}

fn check_shape(feature_names: &[String], x: &DMatrix<f64>, n_outcome: usize) -> Result<(), AppError> {
    if x.nrows() == 0 {
        return Err(AppError::new(2, "Dataset has no rows."));
    }
    if x.ncols() == 0 {
        return Err(AppError::new(2, "Dataset has no feature columns."));
    }
    if feature_names.len() != x.ncols() {
        return Err(AppError::new(
            2,
            format!(
                "Feature name count ({}) does not match column count ({}).",
                feature_names.len(),
                x.ncols()
            ),
        ));
    }
    if n_outcome != x.nrows() {
        return Err(AppError::new(
            2,
            format!("Outcome length ({n_outcome}) does not match row count ({}).", x.nrows()),
        ));
    }
    Ok(())
}
