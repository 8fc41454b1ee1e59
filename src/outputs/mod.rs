//! Output generation for the downstream consumer.
//!
//! # Submodules
//!
//! - [`json`]: Writes the run's result as JSON to stdout and/or a file

pub mod json;
