//! Model specifications and placeholder handling.

pub mod model_spec;
pub mod varying;


pub use model_spec::*;
pub use varying::{fill_placeholders, is_resolved, unresolved_fields};
