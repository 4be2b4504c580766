//! Per-series target scaling
//!
//! Every series gets its own [`StandardScaler`], fitted on the training
//! window of the current fold only and then applied to both windows. Test
//! values never reach the fit.

use crate::error::{PrepError, Result};
use crate::table::is_missing;
use serde::{Deserialize, Serialize};
use series_math::{round_to, MathError, StandardScaler};
use std::fmt;
use std::str::FromStr;

/// Decimal places kept in scaled output
pub const ROUND_DECIMALS: u32 = 5;

/// Handling of training windows whose values are all equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroVariancePolicy {
    /// Abort the dataset with a scaling error
    #[default]
    Fail,
    /// Only subtract the mean and log a warning
    Center,
}

impl fmt::Display for ZeroVariancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroVariancePolicy::Fail => write!(f, "fail"),
            ZeroVariancePolicy::Center => write!(f, "center"),
        }
    }
}

impl FromStr for ZeroVariancePolicy {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(ZeroVariancePolicy::Fail),
            "center" | "centre" => Ok(ZeroVariancePolicy::Center),
            other => Err(PrepError::InvalidParameter(format!(
                "Unknown zero-variance policy '{}'",
                other
            ))),
        }
    }
}

/// Parse target cells; missing cells become `None`
pub fn parse_target(series: &str, cells: &[&str]) -> Result<Vec<Option<f64>>> {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            if is_missing(cell) {
                return Ok(None);
            }
            match cell.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(Some(v)),
                _ => Err(PrepError::DataError(format!(
                    "Series '{}' row {}: target value '{}' is not a finite number",
                    series, i, cell
                ))),
            }
        })
        .collect()
}

/// Render a scaled value as plain decimal text
///
/// Integral values keep one decimal place (`1.0`); everything else uses the
/// shortest round-trip form without an exponent, so `0.00001` stays `0.00001`.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{:.1}", v),
        Some(v) => format!("{}", v),
    }
}

/// Scaled target values of one series for one fold
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSeries {
    /// Parameters fitted on the training window
    pub scaler: StandardScaler,
    /// Scaled, rounded training values
    pub train: Vec<Option<f64>>,
    /// Scaled, rounded test values
    pub test: Vec<Option<f64>>,
    /// Whether the zero-variance fallback was used
    pub centered_only: bool,
}

/// Fits and applies a standard scaler per series
#[derive(Debug, Clone, Copy, Default)]
pub struct PerSeriesScaler {
    policy: ZeroVariancePolicy,
}

impl PerSeriesScaler {
    /// Create a scaler with the given zero-variance policy
    pub fn new(policy: ZeroVariancePolicy) -> Self {
        Self { policy }
    }

    /// Zero-variance policy in effect
    pub fn policy(&self) -> ZeroVariancePolicy {
        self.policy
    }

    /// Fit on the training window; missing values are ignored
    pub fn fit(&self, series: &str, train: &[Option<f64>]) -> Result<(StandardScaler, bool)> {
        let observed: Vec<f64> = train.iter().flatten().copied().collect();
        if observed.is_empty() {
            return Err(PrepError::scaling(
                series,
                "training window has no observed target values",
            ));
        }

        match StandardScaler::fit(&observed) {
            Ok(scaler) => Ok((scaler, false)),
            Err(MathError::ZeroVariance { mean, count }) => match self.policy {
                ZeroVariancePolicy::Fail => Err(PrepError::scaling(
                    series,
                    format!(
                        "training window has zero variance ({} values equal to {})",
                        count, mean
                    ),
                )),
                ZeroVariancePolicy::Center => {
                    tracing::warn!(
                        series,
                        mean,
                        count,
                        "zero-variance training window, centering without scaling"
                    );
                    Ok((StandardScaler::fit_centering(&observed)?, true))
                }
            },
            Err(other) => Err(PrepError::scaling(series, other.to_string())),
        }
    }

    /// Apply a fitted scaler and round to [`ROUND_DECIMALS`]
    pub fn apply(&self, scaler: &StandardScaler, values: &[Option<f64>]) -> Vec<Option<f64>> {
        values
            .iter()
            .map(|v| v.map(|x| round_to(scaler.transform(x), ROUND_DECIMALS)))
            .collect()
    }

    /// Fit on `train`, then transform both windows
    pub fn scale(
        &self,
        series: &str,
        train: &[Option<f64>],
        test: &[Option<f64>],
    ) -> Result<ScaledSeries> {
        let (scaler, centered_only) = self.fit(series, train)?;
        Ok(ScaledSeries {
            scaler,
            train: self.apply(&scaler, train),
            test: self.apply(&scaler, test),
            centered_only,
        })
    }
}
