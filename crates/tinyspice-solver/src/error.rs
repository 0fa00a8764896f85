//! Error types for tinyspice-solver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] tinyspice_core::Error),

    #[error("singular matrix")]
    SingularMatrix,

    #[error("convergence failed after {iterations} iterations (last update {max_delta:e})")]
    ConvergenceFailed { iterations: usize, max_delta: f64 },

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no independent source named {0}")]
    SourceNotFound(String),

    #[error("invalid analysis parameter: {0}")]
    InvalidParameter(String),

    #[error("sweep point {value}: {source}")]
    SweepPoint {
        value: f64,
        #[source]
        source: Box<Error>,
    },

    #[error("unknown probe: {0}")]
    UnknownProbe(String),
}

impl Error {
    /// Attach the independent-variable value of the point that failed.
    pub(crate) fn at_point(self, value: f64) -> Self {
        Error::SweepPoint {
            value,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
