//! Synthetic dataset generation.
//!
//! Used by `unifit fit --sample-count` and by tests that need realistic data
//! without a CSV file. Features are independent standard normals; the outcome
//! is a fixed nonlinear signal plus Gaussian noise, or that signal cut into
//! three classes.

use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::Dataset;
use crate::domain::Mode;
use crate::error::AppError;

/// Class labels for a classification sample, lowest signal first.
pub const SAMPLE_CLASSES: [&str; 3] = ["low", "mid", "high"];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub n_rows: usize,
    pub n_features: usize,
    pub mode: Mode,
    pub seed: u64,
    /// Standard deviation of the additive outcome noise.
    pub noise: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            n_rows: 200,
            n_features: 4,
            mode: Mode::Regression,
            seed: 42,
            noise: 0.5,
        }
    }
}

pub fn generate_sample(config: &SampleConfig) -> Result<Dataset, AppError> {
    if config.n_rows < 2 {
        return Err(AppError::new(2, "Sample count must be at least 2."));
    }
    if config.n_features == 0 {
        return Err(AppError::new(2, "Sample must have at least one feature."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Sample noise must be a non-negative number."));
    }
    if !matches!(config.mode, Mode::Regression | Mode::Classification) {
        return Err(AppError::new(
            2,
            format!("Cannot generate a sample for {} mode.", config.mode),
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let standard = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Feature distribution error: {e}")))?;
    let noise = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let n = config.n_rows;
    let p = config.n_features;
    let x = DMatrix::from_fn(n, p, |_, _| standard.sample(&mut rng));
    let signal: Vec<f64> = (0..n).map(|i| signal(&x, i) + noise.sample(&mut rng)).collect();
    let names: Vec<String> = (1..=p).map(|j| format!("x{j}")).collect();

    match config.mode {
        Mode::Classification => {
            let (lo, hi) = tertiles(&signal);
            let labels: Vec<String> = signal
                .iter()
                .map(|s| {
                    let idx = if *s < lo {
                        0
                    } else if *s < hi {
                        1
                    } else {
                        2
                    };
                    SAMPLE_CLASSES[idx].to_string()
                })
                .collect();
            Dataset::categorical(names, "class", x, &labels)
        }
        _ => Dataset::numeric(names, "y", x, signal),
    }
}

/// Noise-free outcome for row `i`: linear in the first feature, a sine in the
/// second, an interaction of the first and third. Missing features contribute 0.
fn signal(x: &DMatrix<f64>, i: usize) -> f64 {
    let col = |j: usize| if j < x.ncols() { x[(i, j)] } else { 0.0 };
    3.0 * col(0) + 2.0 * (1.5 * col(1)).sin() + col(0) * col(2)
}

fn tertiles(values: &[f64]) -> (f64, f64) {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    (sorted[n / 3], sorted[(2 * n) / 3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sample() {
        let config = SampleConfig::default();
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a.x(), b.x());
        assert_eq!(a.y(), b.y());
        assert_eq!(a.n_rows(), 200);
        assert_eq!(a.feature_names(), ["x1", "x2", "x3", "x4"]);
    }

    #[test]
    fn classification_sample_has_three_balanced_classes() {
        let config = SampleConfig {
            n_rows: 300,
            mode: Mode::Classification,
            ..SampleConfig::default()
        };
        let data = generate_sample(&config).unwrap();
        assert_eq!(data.classes(), ["high", "low", "mid"]);
        for code in 0..3 {
            let count = data.y().iter().filter(|c| **c == code as f64).count();
            assert!((90..=110).contains(&count), "class {code}: {count}");
        }
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let too_small = SampleConfig {
            n_rows: 1,
            ..SampleConfig::default()
        };
        assert_eq!(generate_sample(&too_small).unwrap_err().exit_code(), 2);

        let unsupervised = SampleConfig {
            mode: Mode::Unsupervised,
            ..SampleConfig::default()
        };
        assert!(generate_sample(&unsupervised).is_err());
    }
}
