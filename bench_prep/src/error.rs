//! Error types for the bench_prep crate

use series_math::MathError;
use thiserror::Error;

/// Custom error types for the bench_prep crate
#[derive(Debug, Error)]
pub enum PrepError {
    /// Feature-role configuration does not describe a valid schema
    #[error("Schema error for dataset '{dataset}': {message}")]
    SchemaError { dataset: String, message: String },

    /// A series is too short for the requested fold boundary
    #[error(
        "Insufficient data in dataset '{dataset}', series '{series}': length {length} cannot hold train end {train_end} plus forecast length {forecast_length}"
    )]
    InsufficientData {
        dataset: String,
        series: String,
        length: usize,
        train_end: i64,
        forecast_length: usize,
    },

    /// The scaler could not be fitted on a series' training window
    #[error("Scaling error in dataset '{dataset}', series '{series}': {message}")]
    ScalingError {
        dataset: String,
        series: String,
        message: String,
    },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error in run or metadata configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations, including CSV parsing and writing
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from zip archive writing
    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),
}

impl PrepError {
    /// Build a schema error for `dataset`
    pub fn schema(dataset: &str, message: impl Into<String>) -> Self {
        PrepError::SchemaError {
            dataset: dataset.to_string(),
            message: message.into(),
        }
    }

    /// Build a scaling error for `series`; the dataset is filled in by [`PrepError::located`]
    pub fn scaling(series: &str, message: impl Into<String>) -> Self {
        PrepError::ScalingError {
            dataset: String::new(),
            series: series.to_string(),
            message: message.into(),
        }
    }

    /// Attach the dataset variant and series to errors raised below that level.
    ///
    /// Fields that are already set are kept.
    pub fn located(self, dataset: &str, series: &str) -> Self {
        fn fill(slot: String, value: &str) -> String {
            if slot.is_empty() {
                value.to_string()
            } else {
                slot
            }
        }

        match self {
            PrepError::InsufficientData {
                dataset: d,
                series: s,
                length,
                train_end,
                forecast_length,
            } => PrepError::InsufficientData {
                dataset: fill(d, dataset),
                series: fill(s, series),
                length,
                train_end,
                forecast_length,
            },
            PrepError::ScalingError {
                dataset: d,
                series: s,
                message,
            } => PrepError::ScalingError {
                dataset: fill(d, dataset),
                series: fill(s, series),
                message,
            },
            other => other,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, PrepError>;

impl From<MathError> for PrepError {
    fn from(err: MathError) -> Self {
        PrepError::DataError(err.to_string())
    }
}

impl From<polars::prelude::PolarsError> for PrepError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        PrepError::PolarsError(err.to_string())
    }
}

impl From<toml::de::Error> for PrepError {
    fn from(err: toml::de::Error) -> Self {
        PrepError::ConfigError(err.to_string())
    }
}

impl From<toml::ser::Error> for PrepError {
    fn from(err: toml::ser::Error) -> Self {
        PrepError::ConfigError(err.to_string())
    }
}
