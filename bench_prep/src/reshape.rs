//! Wide-to-long reshaping of raw datasets

use crate::config::WideLayout;
use crate::error::{PrepError, Result};
use crate::table::Table;
use polars::prelude::*;

/// Time column name of an unpivoted table
pub const TIME_COLUMN: &str = "dt";
/// Series column name of an unpivoted table
pub const SERIES_COLUMN: &str = "series_id";
/// Value column name of an unpivoted table
pub const VALUE_COLUMN: &str = "value";

/// Melt a wide table into `(dt, series_id, value)` rows
///
/// The time column is renamed to `dt` and exact duplicate rows are dropped
/// first. Output is series-major: every row of the first value column, then
/// every row of the second, and so on. `prefix` is prepended to each series
/// name.
pub fn unpivot_wide(table: &Table, time_column: &str, prefix: &str) -> Result<Table> {
    if !table.has_column(time_column) {
        return Err(PrepError::DataError(format!(
            "Time column '{}' not found in wide table",
            time_column
        )));
    }

    let mut renamed = table.clone();
    renamed.rename_column(time_column, TIME_COLUMN)?;
    let deduped = renamed.dedup_rows()?;

    let value_columns: Vec<&str> = deduped
        .columns()
        .into_iter()
        .filter(|c| *c != TIME_COLUMN)
        .collect();
    if value_columns.is_empty() {
        return Err(PrepError::DataError(
            "Wide table has no series columns".to_string(),
        ));
    }

    // melt names its outputs `variable` and `value`
    let mut long = deduped.frame().melt([TIME_COLUMN], value_columns)?;
    let series_ids: Vec<Option<String>> = long
        .column("variable")?
        .utf8()?
        .into_iter()
        .map(|name| name.map(|n| format!("{}{}", prefix, n)))
        .collect();
    long.with_column(Series::new(SERIES_COLUMN, series_ids))?;

    Table::from_frame(long.select([TIME_COLUMN, SERIES_COLUMN, VALUE_COLUMN])?)
}

/// Apply a configured wide layout
pub fn apply_layout(table: &Table, layout: &WideLayout) -> Result<Table> {
    let long = unpivot_wide(table, &layout.time_column, &layout.series_prefix)?;
    tracing::debug!(
        dataset = %layout.name,
        wide_columns = table.width(),
        rows = long.height(),
        "unpivoted wide dataset"
    );
    Ok(long)
}
