//! Error types for the forecast_pangan crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the forecast_pangan crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The source table held no usable rows for the requested series
    #[error("No usable observations: {0}")]
    DataUnavailable(String),

    /// Fewer valid feature rows than the model's sequence length
    #[error(
        "Insufficient history: {required} valid feature rows are needed after \
         feature derivation, only {available} available"
    )]
    InsufficientHistory { required: usize, available: usize },

    /// Predictor input/output contract violated
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Scaler width does not match the rows it is applied to
    #[error("Scaler mismatch: {0}")]
    ScalerMismatch(String),

    /// A price value could not be interpreted as a number
    #[error("Numeric coercion failure: {0}")]
    NumericCoercion(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
