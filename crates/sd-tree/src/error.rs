use thiserror::Error;

/// Errors produced by tree model operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
