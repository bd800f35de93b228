use thiserror::Error;

/// Errors raised by the numerical and statistical engines.
///
/// All of them are input-contract violations: every operation either returns
/// a complete result or one of these, never a partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// State-vector data is not complex-valued where autocorrelation needs it.
    #[error("type consistency error: {0}")]
    TypeConsistency(String),
    /// Lengths or row counts do not fit together.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// An index sequence points outside the vector collection.
    #[error("index {index} out of range for {len} vectors")]
    IndexRange { index: usize, len: usize },
    /// A required column is absent from a labeled table.
    #[error("missing column '{0}'")]
    MissingColumn(String),
}
