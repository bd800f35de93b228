//! Post-processing for time-dependent CI simulation output.
//!
//! The [`analysis`] engines and the [`data::filter`] significance filter are
//! pure functions over in-memory data. [`data::loader`], [`run`] and
//! [`output`] are the file-facing adapters used by the `rusty-tdcia` binary.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod output;
pub mod run;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use run::{analyze, RunOutput, RunType};
