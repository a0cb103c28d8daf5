use thiserror::Error;

/// Errors raised by the clustering routines.
///
/// Every variant describes input the routines cannot work with: undersized or
/// ragged matrices, invalid cluster counts, or an empty candidate list. A
/// failing call never returns a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("at least {required} observations are required, found {found}")]
    TooFewObservations { required: usize, found: usize },

    #[error("observation {row} has {found} features, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("observation matrix must have at least one row and one column")]
    EmptyMatrix,

    #[error("non-finite value at observation {row}, feature {column}")]
    NonFinite { row: usize, column: usize },

    #[error("cluster count {k} is invalid for {observations} observations")]
    InvalidClusterCount { k: usize, observations: usize },

    #[error("number of restarts must be positive")]
    InvalidRestarts,

    #[error("candidate cluster counts must not be empty")]
    EmptyCandidates,

    #[error("invalid row labels: {0}")]
    InvalidLabels(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// All variants are input validation failures.
    pub fn is_invalid_input(&self) -> bool {
        true
    }
}

pub type Result<T> = std::result::Result<T, Error>;
