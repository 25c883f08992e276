//! Error type shared by every classifier and utility.
use std::io;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating inputs, fitting class statistics
/// or evaluating a classifier.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed class sets, selections or parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A selected attribute does not exist in the probe matrices.
    #[error("attribute index {index} out of range for {count} attributes")]
    AttributeOutOfRange { index: usize, count: usize },

    /// Neighbour count outside `1..=max`.
    #[error("neighbour count {k} outside valid range 1..={max}")]
    InvalidNeighbourCount { k: usize, max: usize },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A covariance matrix needs at least `required` probes.
    #[error("covariance needs at least {required} probes, found {found}")]
    InsufficientProbes { required: usize, found: usize },

    /// Neither direct inversion nor the pseudoinverse produced a usable
    /// (positive rank) matrix.
    #[error("covariance matrix is not invertible")]
    SingularCovariance,

    /// The singular value decomposition could not build a pseudoinverse.
    #[error("linear algebra: {0}")]
    LinearAlgebra(String),

    /// KNM could not build invertible sub-cluster statistics for a class.
    #[error("no invertible covariance for class `{class}` after {attempts} attempts")]
    ExhaustedRetry { class: String, attempts: usize },

    /// A class, or the whole run, has nothing to train on or evaluate.
    #[error("empty evaluation set: {0}")]
    EmptyEvaluationSet(String),

    /// Badly formatted data file.
    #[error("data format: {0}")]
    DataFormat(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
