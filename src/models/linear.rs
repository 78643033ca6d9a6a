//! Linear regression: ordinary least squares and elastic net.
//!
//! The elastic net minimizes
//!
//! ```text
//! (1 / 2n) Σ (y_i - β0 - x_i^T β)^2 + λ [ (1 - α)/2 ‖β‖² + α ‖β‖₁ ]
//! ```
//!
//! by cyclic coordinate descent on centered (and optionally standardized)
//! columns, then maps the coefficients back to the original scale.

use anyhow::{Context, bail};
use nalgebra::{DMatrix, DVector};

use crate::data::Dataset;
use crate::math::solve_least_squares;
use crate::models::FittedModel;

/// Elastic-net settings at a single penalty value.
#[derive(Debug, Clone, Copy)]
pub struct ElasticNetParams {
    pub lambda: f64,
    pub alpha: f64,
    pub standardize: bool,
    pub max_iter: usize,
    pub tolerance: f64,
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    engine: String,
    intercept: f64,
    coefficients: Vec<f64>,
    feature_names: Vec<String>,
    penalty: Option<ElasticNetParams>,
    iterations: usize,
}

impl LinearModel {
    /// Ordinary least squares with an intercept.
    pub fn fit_ols(engine: &str, data: &Dataset, tol: Option<f64>) -> anyhow::Result<Self> {
        ensure_numeric(data)?;
        let n = data.n_rows();
        let p = data.n_features();
        if let Some(t) = tol {
            if !(t.is_finite() && t >= 0.0) {
                bail!("tolerance must be a non-negative number, got {t}");
            }
        }

        let mut design = DMatrix::<f64>::zeros(n, p + 1);
        for i in 0..n {
            design[(i, 0)] = 1.0;
            for j in 0..p {
                design[(i, j + 1)] = data.x()[(i, j)];
            }
        }
        let y = DVector::from_column_slice(data.y());

        let beta = solve_least_squares(&design, &y, tol)
            .context("least squares system is too ill-conditioned to solve")?;

        Ok(Self {
            engine: engine.to_string(),
            intercept: beta[0],
            coefficients: beta.iter().skip(1).copied().collect(),
            feature_names: data.feature_names().to_vec(),
            penalty: None,
            iterations: 0,
        })
    }

    /// Elastic net at a single `lambda`.
    pub fn fit_elastic_net(engine: &str, data: &Dataset, params: ElasticNetParams) -> anyhow::Result<Self> {
        ensure_numeric(data)?;
        if !(params.lambda.is_finite() && params.lambda >= 0.0) {
            bail!("penalty must be a non-negative number, got {}", params.lambda);
        }
        if !(0.0..=1.0).contains(&params.alpha) {
            bail!("mixture must be in [0, 1], got {}", params.alpha);
        }
        if params.max_iter == 0 {
            bail!("maximum iterations must be at least 1");
        }
        if !(params.tolerance.is_finite() && params.tolerance > 0.0) {
            bail!("convergence threshold must be positive, got {}", params.tolerance);
        }

        let n = data.n_rows();
        let p = data.n_features();
        let nf = n as f64;
        let x = data.x();

        let y_mean = data.y().iter().sum::<f64>() / nf;
        let mut means = vec![0.0; p];
        let mut scales = vec![1.0; p];
        for j in 0..p {
            let col = x.column(j);
            means[j] = col.sum() / nf;
            if params.standardize {
                let var = col.iter().map(|v| (v - means[j]).powi(2)).sum::<f64>() / nf;
                scales[j] = var.sqrt();
            }
        }

        // Centered, scaled working columns; constant columns stay at zero.
        let mut z = DMatrix::<f64>::zeros(n, p);
        let mut col_sq = vec![0.0; p];
        for j in 0..p {
            if scales[j] <= 1e-12 {
                continue;
            }
            for i in 0..n {
                z[(i, j)] = (x[(i, j)] - means[j]) / scales[j];
            }
            col_sq[j] = z.column(j).iter().map(|v| v * v).sum::<f64>() / nf;
        }

        let mut resid: Vec<f64> = data.y().iter().map(|y| y - y_mean).collect();
        let mut b = vec![0.0; p];
        let l1 = params.lambda * params.alpha;
        let l2 = params.lambda * (1.0 - params.alpha);

        let mut iterations = 0;
        let mut converged = false;
        while iterations < params.max_iter {
            iterations += 1;
            let mut max_change: f64 = 0.0;
            for j in 0..p {
                if col_sq[j] == 0.0 {
                    continue;
                }
                let old = b[j];
                let rho = (0..n).map(|i| z[(i, j)] * resid[i]).sum::<f64>() / nf + col_sq[j] * old;
                let new = soft_threshold(rho, l1) / (col_sq[j] + l2);
                let delta = new - old;
                if delta != 0.0 {
                    for i in 0..n {
                        resid[i] -= z[(i, j)] * delta;
                    }
                    b[j] = new;
                    max_change = max_change.max(col_sq[j] * delta * delta);
                }
            }
            if max_change < params.tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            log::warn!(
                "{engine}: coordinate descent stopped after {} iterations without converging",
                params.max_iter
            );
        }

        let coefficients: Vec<f64> = (0..p)
            .map(|j| if scales[j] <= 1e-12 { 0.0 } else { b[j] / scales[j] })
            .collect();
        let intercept = y_mean - (0..p).map(|j| means[j] * coefficients[j]).sum::<f64>();

        Ok(Self {
            engine: engine.to_string(),
            intercept,
            coefficients,
            feature_names: data.feature_names().to_vec(),
            penalty: Some(params),
            iterations,
        })
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl FittedModel for LinearModel {
    fn predict(&self, x: &DMatrix<f64>) -> anyhow::Result<Vec<f64>> {
        if x.ncols() != self.coefficients.len() {
            bail!(
                "expected {} feature columns, got {}",
                self.coefficients.len(),
                x.ncols()
            );
        }
        Ok(x
            .row_iter()
            .map(|row| {
                self.intercept
                    + row
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(v, c)| v * c)
                        .sum::<f64>()
            })
            .collect())
    }

    fn describe(&self) -> String {
        let terms: Vec<String> = self
            .feature_names
            .iter()
            .zip(&self.coefficients)
            .map(|(name, c)| format!("{name}={c:.4}"))
            .collect();
        let penalty = match &self.penalty {
            Some(p) => format!(" lambda={} alpha={} ({} iterations)", p.lambda, p.alpha, self.iterations),
            None => String::new(),
        };
        format!(
            "{} linear regression:{penalty} intercept={:.4} {}",
            self.engine,
            self.intercept,
            terms.join(" ")
        )
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

fn ensure_numeric(data: &Dataset) -> anyhow::Result<()> {
    if data.is_categorical() {
        bail!(
            "linear regression requires a numeric outcome, but '{}' is categorical",
            data.outcome_name()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = 1 + 2a - 0.5b, no noise.
    fn exact_data() -> Dataset {
        let n = 30;
        let mut values = Vec::with_capacity(n * 2);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            let a = i as f64 * 0.3;
            let b = ((i * 5) % 11) as f64;
            values.push(a);
            values.push(b);
            y.push(1.0 + 2.0 * a - 0.5 * b);
        }
        Dataset::numeric(
            vec!["a".into(), "b".into()],
            "y",
            DMatrix::from_row_slice(n, 2, &values),
            y,
        )
        .unwrap()
    }

    fn enet(lambda: f64, alpha: f64) -> ElasticNetParams {
        ElasticNetParams {
            lambda,
            alpha,
            standardize: true,
            max_iter: 100_000,
            tolerance: 1e-14,
        }
    }

    #[test]
    fn ols_recovers_exact_coefficients() {
        let model = LinearModel::fit_ols("lm", &exact_data(), None).unwrap();
        assert!((model.intercept() - 1.0).abs() < 1e-8);
        assert!((model.coefficients()[0] - 2.0).abs() < 1e-8);
        assert!((model.coefficients()[1] + 0.5).abs() < 1e-8);
    }

    #[test]
    fn zero_penalty_elastic_net_matches_ols() {
        let data = exact_data();
        let model = LinearModel::fit_elastic_net("glmnet", &data, enet(0.0, 1.0)).unwrap();
        assert!((model.intercept() - 1.0).abs() < 1e-5);
        assert!((model.coefficients()[0] - 2.0).abs() < 1e-5);
        assert!((model.coefficients()[1] + 0.5).abs() < 1e-5);
    }

    #[test]
    fn large_lasso_penalty_zeroes_coefficients() {
        let data = exact_data();
        let model = LinearModel::fit_elastic_net("glmnet", &data, enet(1e6, 1.0)).unwrap();
        assert!(model.coefficients().iter().all(|c| *c == 0.0));
        let mean = data.y().iter().sum::<f64>() / data.n_rows() as f64;
        assert!((model.intercept() - mean).abs() < 1e-9);
    }

    #[test]
    fn ridge_shrinks_without_zeroing() {
        let data = exact_data();
        let model = LinearModel::fit_elastic_net("glmnet", &data, enet(1.0, 0.0)).unwrap();
        let a = model.coefficients()[0];
        assert!(a > 0.0 && a < 2.0);
    }

    #[test]
    fn invalid_mixture_is_rejected() {
        let err = LinearModel::fit_elastic_net("glmnet", &exact_data(), enet(0.1, 1.5)).unwrap_err();
        assert!(err.to_string().contains("mixture"));
    }

    #[test]
    fn predictions_follow_coefficients() {
        let data = exact_data();
        let model = LinearModel::fit_ols("lm", &data, None).unwrap();
        let pred = model.predict(data.x()).unwrap();
        for (p, y) in pred.iter().zip(data.y()) {
            assert!((p - y).abs() < 1e-8);
        }
    }
}
