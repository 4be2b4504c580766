//! Rolling fold boundaries
//!
//! Each dataset is split five times. Fold 5 tests on the last
//! `forecast_length` steps of every series; each earlier fold moves the test
//! window back by `roll_window_size` steps:
//!
//! ```text
//! train_end = len - (5 - fold) * roll_window_size - forecast_length
//! train     = [0, train_end)
//! test      = [train_end, train_end + forecast_length)
//! ```
//!
//! Without a rolling window the split is taken once, at `len - forecast_length`.

use crate::error::{PrepError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of rolling folds per dataset
pub const NUM_FOLDS: u32 = 5;

/// One rolling fold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldConfig {
    fold_num: u32,
    roll_window_size: usize,
}

impl FoldConfig {
    /// Create a fold; `fold_num` must be in `1..=5` and the window positive
    pub fn new(fold_num: u32, roll_window_size: usize) -> Result<Self> {
        if !(1..=NUM_FOLDS).contains(&fold_num) {
            return Err(PrepError::InvalidParameter(format!(
                "Fold number must be between 1 and {}, got {}",
                NUM_FOLDS, fold_num
            )));
        }
        if roll_window_size == 0 {
            return Err(PrepError::InvalidParameter(
                "Rolling window size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            fold_num,
            roll_window_size,
        })
    }

    /// All five folds for a rolling window, earliest first
    pub fn all(roll_window_size: usize) -> Result<Vec<FoldConfig>> {
        (1..=NUM_FOLDS)
            .map(|f| FoldConfig::new(f, roll_window_size))
            .collect()
    }

    pub fn fold_num(&self) -> u32 {
        self.fold_num
    }

    pub fn roll_window_size(&self) -> usize {
        self.roll_window_size
    }

    /// Steps between this fold's test window and the end of the series
    fn offset(&self) -> i128 {
        i128::from(NUM_FOLDS - self.fold_num) * self.roll_window_size as i128
    }
}

/// How a dataset is split into train and test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Rolling fold
    Folded(FoldConfig),
    /// One split at `len - forecast_length`
    SingleSplit,
}

impl SplitMode {
    /// Split modes for a dataset: five folds, or a single split when no window is set
    pub fn for_window(roll_window_size: Option<usize>) -> Result<Vec<SplitMode>> {
        match roll_window_size {
            Some(w) => Ok(FoldConfig::all(w)?
                .into_iter()
                .map(SplitMode::Folded)
                .collect()),
            None => Ok(vec![SplitMode::SingleSplit]),
        }
    }

    /// Name of the dataset variant this split produces
    pub fn variant_name(&self, dataset: &str, forecast_length: usize) -> String {
        match self {
            SplitMode::Folded(fold) => format!(
                "{}_fcst_len_{}_fold_{}",
                dataset,
                forecast_length,
                fold.fold_num()
            ),
            SplitMode::SingleSplit => format!("{}_forecast_len_{}", dataset, forecast_length),
        }
    }

    fn offset(&self) -> i128 {
        match self {
            SplitMode::Folded(fold) => fold.offset(),
            SplitMode::SingleSplit => 0,
        }
    }
}

/// Signed train end for a series, before any range check
///
/// Computed in 128 bits so that no window size or length can overflow.
pub fn raw_train_end(series_len: usize, mode: SplitMode, forecast_length: usize) -> i128 {
    series_len as i128 - mode.offset() - forecast_length as i128
}

/// Train/test split point of one series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldBoundary {
    train_end: usize,
    forecast_length: usize,
}

impl FoldBoundary {
    /// Compute the boundary for a series of `series_len` rows
    pub fn compute(series_len: usize, mode: SplitMode, forecast_length: usize) -> Result<Self> {
        if forecast_length == 0 {
            return Err(PrepError::InvalidParameter(
                "Forecast length must be greater than zero".to_string(),
            ));
        }

        let train_end = raw_train_end(series_len, mode, forecast_length);
        if train_end < 0 || train_end + forecast_length as i128 > series_len as i128 {
            return Err(PrepError::InsufficientData {
                dataset: String::new(),
                series: String::new(),
                length: series_len,
                train_end: train_end.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
                forecast_length,
            });
        }

        Ok(Self {
            train_end: train_end as usize,
            forecast_length,
        })
    }

    /// First row of the test window
    pub fn train_end(&self) -> usize {
        self.train_end
    }

    /// Rows used for training
    pub fn train_range(&self) -> Range<usize> {
        0..self.train_end
    }

    /// Rows held out for testing
    pub fn test_range(&self) -> Range<usize> {
        self.train_end..self.train_end + self.forecast_length
    }
}
