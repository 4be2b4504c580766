//! Partitioning a dataset into series
//!
//! A [`SeriesGrouping`] lists, for each series id in first-seen order, the
//! table rows that belong to it in their original order. Groupings are
//! reused across folds through a [`GroupingCache`] that the caller owns and
//! passes around explicitly.

use crate::error::Result;
use crate::table::{is_missing, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::{GroupsProxy, TakeRandomUtf8};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Rows of one series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesGroup {
    /// Value of the id column
    pub id: String,
    /// Row indices into the source table, in table order
    pub rows: Vec<usize>,
}

impl SeriesGroup {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All series of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesGrouping {
    id_column: String,
    source_rows: usize,
    groups: Vec<SeriesGroup>,
}

impl SeriesGrouping {
    /// Group the rows of `table` by `id_column`
    ///
    /// Uses a stable group-by, so groups come out ordered by their first row.
    pub fn build(table: &Table, id_column: &str) -> Result<Self> {
        let ids = table.utf8(id_column)?;
        let by = table.frame().groupby_stable([id_column])?;
        let group_id = |first: usize| ids.get(first).unwrap_or("").to_string();

        let groups = match by.get_groups() {
            GroupsProxy::Idx(idx) => idx
                .iter()
                .map(|(first, rows)| SeriesGroup {
                    id: group_id(first as usize),
                    rows: rows.iter().map(|&r| r as usize).collect(),
                })
                .collect(),
            GroupsProxy::Slice { groups, .. } => groups
                .iter()
                .map(|&[first, len]| SeriesGroup {
                    id: group_id(first as usize),
                    rows: (first as usize..(first + len) as usize).collect(),
                })
                .collect(),
        };

        Ok(Self {
            id_column: id_column.to_string(),
            source_rows: table.height(),
            groups,
        })
    }

    /// Groups in first-seen order
    pub fn groups(&self) -> &[SeriesGroup] {
        &self.groups
    }

    /// Number of series
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Column the grouping was built on
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Row count of the table the grouping was built from
    pub fn source_rows(&self) -> usize {
        self.source_rows
    }

    /// Whether this grouping could have come from `table` grouped by `id_column`
    fn matches(&self, table: &Table, id_column: &str) -> bool {
        self.id_column == id_column && self.source_rows == table.height()
    }

    /// Ids of series whose time column is not non-decreasing
    ///
    /// `data_type` is the schema type of the time field; `INT` columns are
    /// compared as integers, anything else as timestamps when they parse.
    pub fn unordered_series(
        &self,
        table: &Table,
        time_column: &str,
        data_type: &str,
    ) -> Result<Vec<String>> {
        let times = table.column(time_column)?;
        let integer = data_type.eq_ignore_ascii_case("INT");

        Ok(self
            .groups
            .iter()
            .filter(|group| {
                let keys: Vec<TimeKey> = group
                    .rows
                    .iter()
                    .map(|&r| times[r])
                    .filter(|cell| !is_missing(cell))
                    .map(|cell| TimeKey::parse(cell, integer))
                    .collect();
                keys.windows(2)
                    .any(|w| w[0].compare(&w[1]) == Ordering::Greater)
            })
            .map(|group| group.id.clone())
            .collect())
    }
}

/// A parsed time cell
#[derive(Debug, Clone, PartialEq)]
enum TimeKey {
    Step(i64),
    Stamp(NaiveDateTime),
    Text(String),
}

impl TimeKey {
    fn parse(cell: &str, integer: bool) -> Self {
        let cell = cell.trim();
        if integer {
            if let Ok(step) = cell.parse::<i64>() {
                return TimeKey::Step(step);
            }
        }
        const FORMATS: [&str; 4] = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
        ];
        for fmt in FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(cell, fmt) {
                return TimeKey::Stamp(ts);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(cell, "%Y-%m-%d") {
            if let Some(ts) = date.and_hms_opt(0, 0, 0) {
                return TimeKey::Stamp(ts);
            }
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(cell) {
            return TimeKey::Stamp(ts.naive_utc());
        }
        TimeKey::Text(cell.to_string())
    }

    fn compare(&self, other: &TimeKey) -> Ordering {
        match (self, other) {
            (TimeKey::Step(a), TimeKey::Step(b)) => a.cmp(b),
            (TimeKey::Stamp(a), TimeKey::Stamp(b)) => a.cmp(b),
            (TimeKey::Text(a), TimeKey::Text(b)) => a.cmp(b),
            // Mixed kinds cannot be ordered; treat as in order
            _ => Ordering::Equal,
        }
    }
}

/// Memo of groupings keyed by dataset name
///
/// Entries are only valid while the table they were built from is
/// unchanged. A lookup with a table of a different height or a different id
/// column rebuilds the entry; any other change to the table must be followed
/// by [`GroupingCache::invalidate`].
#[derive(Debug, Default)]
pub struct GroupingCache {
    entries: HashMap<String, Arc<SeriesGrouping>>,
}

impl GroupingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached grouping for `key`, building it on first use
    pub fn get_or_group(
        &mut self,
        key: &str,
        table: &Table,
        id_column: &str,
    ) -> Result<Arc<SeriesGrouping>> {
        if let Some(existing) = self.entries.get(key) {
            if existing.matches(table, id_column) {
                return Ok(Arc::clone(existing));
            }
            tracing::debug!(key, "grouping cache entry is stale, regrouping");
        }

        let grouping = Arc::new(SeriesGrouping::build(table, id_column)?);
        tracing::debug!(key, series = grouping.len(), "grouped dataset");
        self.entries.insert(key.to_string(), Arc::clone(&grouping));
        Ok(grouping)
    }

    /// Drop the entry for `key`; returns whether one existed
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_strs(
            &["id", "t", "y"],
            &[
                vec!["b", "1", "1"],
                vec!["a", "1", "2"],
                vec!["b", "2", "3"],
                vec!["a", "2", "4"],
                vec!["c", "1", "5"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_first_seen_order() {
        let grouping = SeriesGrouping::build(&table(), "id").unwrap();
        let ids: Vec<&str> = grouping.groups().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(grouping.groups()[0].rows, vec![0, 2]);
        assert_eq!(grouping.groups()[1].rows, vec![1, 3]);
    }

    #[test]
    fn test_interleaved_series_keep_row_order() {
        let t = Table::from_strs(
            &["id", "t"],
            &[
                vec!["x", "1"],
                vec!["y", "1"],
                vec!["x", "2"],
                vec!["", "1"],
                vec!["y", "2"],
                vec!["x", "3"],
            ],
        )
        .unwrap();
        let grouping = SeriesGrouping::build(&t, "id").unwrap();
        let ids: Vec<&str> = grouping.groups().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", ""]);
        assert_eq!(grouping.groups()[0].rows, vec![0, 2, 5]);
        assert_eq!(grouping.groups()[1].rows, vec![1, 4]);
        assert_eq!(grouping.groups()[2].rows, vec![3]);
    }

    #[test]
    fn test_missing_id_column() {
        assert!(SeriesGrouping::build(&table(), "series").is_err());
    }

    #[test]
    fn test_unordered_detection() {
        let t = Table::from_strs(
            &["id", "t"],
            &[
                vec!["a", "2020-01-02"],
                vec!["a", "2020-01-01"],
                vec!["b", "2020-01-01"],
                vec!["b", "2020-01-02 00:00:00"],
            ],
        )
        .unwrap();
        let grouping = SeriesGrouping::build(&t, "id").unwrap();
        assert_eq!(
            grouping.unordered_series(&t, "t", "DATETIME").unwrap(),
            vec!["a".to_string()]
        );
    }

    #[test]
    fn test_integer_steps_compare_numerically() {
        let t = Table::from_strs(&["id", "t"], &[vec!["a", "9"], vec!["a", "10"]]).unwrap();
        let grouping = SeriesGrouping::build(&t, "id").unwrap();
        assert!(grouping.unordered_series(&t, "t", "INT").unwrap().is_empty());
    }
}
