//! Backend registry: model catalog plus per-engine descriptors.

pub mod descriptor;
#[allow(clippy::module_inception)]
pub mod registry;

pub use descriptor::*;
pub use registry::*;
