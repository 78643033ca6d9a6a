//! Finalization and fitting.
//!
//! Responsibilities:
//!
//! - translate a resolved specification into one engine's native arguments
//! - call the engine's fit function and wrap its failures
//! - run independent fits in parallel

pub mod dispatch;
pub mod finalize;
pub mod parallel;

pub use dispatch::*;
pub use finalize::*;
pub use parallel::*;
