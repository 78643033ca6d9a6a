//! Built-in backends.
//!
//! These are registered through the same [`Registry`] API a third-party
//! backend would use; nothing in the finalizer or dispatcher knows about them.

pub mod args;
pub mod linear_reg;
pub mod rand_forest;

use crate::error::SpecError;
use crate::registry::Registry;

/// Register the built-in model catalog and engines.
pub fn register_builtin(registry: &mut Registry) -> Result<(), SpecError> {
    registry.register_model(rand_forest::definition())?;
    registry.register_model(linear_reg::definition())?;

    registry.register(rand_forest::ranger())?;
    registry.register(rand_forest::random_forest())?;
    registry.register(linear_reg::lm())?;
    registry.register(linear_reg::glmnet())?;
    Ok(())
}
