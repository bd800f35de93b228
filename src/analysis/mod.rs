//! Numerical and statistical engines.
//!
//! Every function here is pure: inputs are borrowed, outputs freshly
//! allocated, and failures are reported as [`AnalysisError`](crate::error::AnalysisError).

pub mod correlation;
pub mod distance;
pub mod spectral;
pub mod waveform;

pub use correlation::{rank_correlations, CorrelationEntry, CorrelationTable};
pub use distance::euclidean_distance;
pub use spectral::{transform, transform_each, DftMode, Spectrum};
pub use waveform::{aucofu, calc_auto, decode_waveform};
