//! Fitted-model implementations behind the built-in engines.
//!
//! The dispatcher only ever sees a `Box<dyn FittedModel>`; these modules are
//! what the built-in backends put in that box.

use std::fmt;

use nalgebra::DMatrix;

pub mod forest;
pub mod linear;
pub mod tree;

pub use forest::*;
pub use linear::*;
pub use tree::*;

/// A trained model returned by a backend's fit callable.
pub trait FittedModel: fmt::Debug + Send + Sync {
    /// Predict one value per row of `x`.
    ///
    /// Classification models return class codes (see [`crate::data::Dataset::classes`]).
    fn predict(&self, x: &DMatrix<f64>) -> anyhow::Result<Vec<f64>>;

    /// One-line human-readable summary.
    fn describe(&self) -> String;
}
