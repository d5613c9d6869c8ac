//! Error types for the price-lstm library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the input file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader rejected the file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Config file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A data row has no value in the price column
    #[error("row {row}: missing column {column}")]
    MissingColumn { row: usize, column: usize },

    /// A data row has a value that is not a decimal number
    #[error("row {row}: invalid price {value:?}")]
    InvalidPrice { row: usize, value: String },

    /// Normalization was asked for on an empty series
    #[error("series is empty")]
    EmptySeries,

    /// The series holds a NaN or infinite value, which has no place on a min-max scale
    #[error("value at index {index} is not finite ({value})")]
    NonFiniteValue { index: usize, value: f64 },

    /// Every value of the series is identical, so min-max scaling is undefined
    #[error("cannot normalize a constant series (every value is {value})")]
    DegenerateRange { value: f64 },

    /// Too few values to build a single window/label pair
    #[error("series of length {len} is too short for windows of length {sequence_length}")]
    InsufficientData { len: usize, sequence_length: usize },

    /// A vector or matrix has the wrong size for the cell it is passed to
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },

    /// `backward` was called without a matching `forward`
    #[error("backward called without a preceding forward pass")]
    BackwardWithoutForward,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn length_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        Error::DimensionMismatch {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn shape_mismatch(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Error::DimensionMismatch {
            what,
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }

    /// True for violations of the cell's calling contract, as opposed to bad input data
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::DimensionMismatch { .. } | Error::BackwardWithoutForward
        )
    }
}
