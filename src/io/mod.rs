//! Input/output helpers.
//!
//! - CSV dataset ingest + validation (`ingest`)
//! - prediction exports (`export`)
//! - spec JSON read/write (`spec_file`)

pub mod export;
pub mod ingest;
pub mod spec_file;

pub use export::*;
pub use ingest::*;
pub use spec_file::*;
