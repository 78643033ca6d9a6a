//! Least squares solver.
//!
//! The linear engines solve small dense problems of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We use SVD so tall (more rows than columns) and rank-deficient design
//!   matrices are handled without panicking. (Nalgebra's `QR::solve` is meant
//!   for square systems.)
//! - Singular values below the tolerance are treated as zero, which yields the
//!   minimum-norm solution for collinear columns.

use nalgebra::{DMatrix, DVector};

/// Tolerances tried in order when the caller does not pin one.
const DEFAULT_TOLERANCES: [f64; 3] = [1e-10, 1e-8, 1e-6];

/// Solve a least squares problem using SVD.
///
/// With `tol = Some(t)` only that tolerance is tried. Returns `None` if the
/// system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>, tol: Option<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    let pinned = tol.map(|t| [t]);
    let tolerances: &[f64] = match &pinned {
        Some(t) => t,
        None => &DEFAULT_TOLERANCES,
    };

    // Try progressively looser tolerances if strict solve fails.
    for &tol in tolerances {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y, None).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn collinear_columns_get_minimum_norm_solution() {
        // Second and third columns are identical; the weight is split evenly.
        let x = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, 5.0]);

        let beta = solve_least_squares(&x, &y, Some(1e-8)).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-8);
        assert!((beta[1] - 1.0).abs() < 1e-8);
        assert!((beta[2] - 1.0).abs() < 1e-8);
    }
}
