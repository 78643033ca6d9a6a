//! `unifit` library crate.
//!
//! One vocabulary of model arguments, many engines. A [`spec::ModelSpecification`]
//! names a model type, a mode and canonical arguments (some possibly left as
//! `tune()` placeholders); [`fit::finalize`] translates it against a
//! [`registry::Registry`] into one engine's native call, and [`fit::fit`] runs it.
//!
//! The binary (`unifit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - third-party engines register through the same API as the built-in ones

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod engines;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod registry;
pub mod report;
pub mod spec;
