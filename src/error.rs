//! Error types for the salescast library.

use thiserror::Error;

/// Result type alias for salescast operations.
pub type Result<T> = std::result::Result<T, SalescastError>;

/// Errors that can occur across the forecasting pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SalescastError {
    /// A required record field is missing or malformed and the caller asked
    /// to abort instead of dropping the record.
    #[error("data quality: {0}")]
    DataQuality(String),

    /// Series is too short for the requested operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Series construction produced no usable months.
    #[error("empty series")]
    EmptySeries,

    /// No candidate specification in the order search could be fitted.
    #[error("order search failed: none of {candidates_tried} candidate specifications produced a usable fit")]
    ModelSearchFailure { candidates_tried: usize },

    /// Parameter estimation exhausted its iteration budget.
    #[error("estimation of {spec} did not converge within {iterations} iterations")]
    NonConvergence { spec: String, iterations: usize },

    /// Forecast results cover different future periods and cannot be aligned.
    #[error("misaligned forecasts: {0}")]
    MisalignedForecast(String),
}
