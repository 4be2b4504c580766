//! Zero-mean / unit-variance standardization
//!
//! The scaler is fitted once on a slice of observations and then applied to
//! any number of values. Statistics use the population form (divide by `n`),
//! which is what column scalers in the usual ML toolkits do.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Relative tolerance under which a standard deviation counts as zero.
const ZERO_SCALE_TOLERANCE: f64 = 10.0 * f64::EPSILON;

/// Fitted standardization parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: f64,
    scale: f64,
    n_samples: usize,
}

impl StandardScaler {
    /// Fit a scaler on `values`.
    ///
    /// Fails with [`MathError::ZeroVariance`] when every value is (numerically)
    /// identical, since dividing by the resulting scale is meaningless.
    pub fn fit(values: &[f64]) -> Result<Self> {
        let (mean, std_dev) = Self::moments(values)?;

        if std_dev <= ZERO_SCALE_TOLERANCE * mean.abs().max(1.0) {
            return Err(MathError::ZeroVariance {
                mean,
                count: values.len(),
            });
        }

        Ok(Self {
            mean,
            scale: std_dev,
            n_samples: values.len(),
        })
    }

    /// Fit a scaler that only removes the mean (unit scale).
    pub fn fit_centering(values: &[f64]) -> Result<Self> {
        let (mean, _) = Self::moments(values)?;
        Ok(Self {
            mean,
            scale: 1.0,
            n_samples: values.len(),
        })
    }

    fn moments(values: &[f64]) -> Result<(f64, f64)> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a scaler on an empty slice".to_string(),
            ));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(format!(
                "Non-finite value {} in fit data",
                bad
            )));
        }

        let mean = values.iter().mean();
        let std_dev = values.iter().population_std_dev();
        Ok((mean, std_dev))
    }

    /// Mean of the fit data
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Divisor applied after centering
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Number of observations the scaler was fitted on
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Standardize a single value
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}
