//! # Series Math
//!
//! Numeric building blocks used when preparing benchmark series:
//! a population-statistics standard scaler and decimal rounding that
//! matches the half-to-even behaviour of common dataframe tooling.

use thiserror::Error;

pub mod rounding;
pub mod standardize;

pub use rounding::round_to;
pub use standardize::StandardScaler;

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Zero variance: all {count} values equal {mean}")]
    ZeroVariance { mean: f64, count: usize },
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
