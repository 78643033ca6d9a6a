//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - the task `Mode` enum
//! - scalar argument values (`Value`) and argument slots (`ArgValue`)
//! - the native argument map handed to backends (`NativeArgs`)

pub mod types;

pub use types::*;
