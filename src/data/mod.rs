//! Input data: the in-memory dataset type and a synthetic generator.

pub mod dataset;
pub mod sample;

pub use dataset::Dataset;
pub use sample::{SampleConfig, generate_sample};
