use bench_prep::grouping::{GroupingCache, SeriesGrouping};
use bench_prep::table::Table;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn long_table(ids: &[&str]) -> Table {
    let rows: Vec<Vec<&str>> = ids.iter().map(|id| vec![*id, "1"]).collect();
    Table::from_strs(&["series", "y"], &rows).unwrap()
}

#[test]
fn test_groups_keep_row_order() {
    let table = long_table(&["x", "y", "x", "z", "y", "x"]);
    let grouping = SeriesGrouping::build(&table, "series").unwrap();

    assert_eq!(grouping.len(), 3);
    assert_eq!(grouping.source_rows(), 6);
    let summary: Vec<(&str, Vec<usize>)> = grouping
        .groups()
        .iter()
        .map(|g| (g.id.as_str(), g.rows.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![("x", vec![0, 2, 5]), ("y", vec![1, 4]), ("z", vec![3])]
    );
}

#[test]
fn test_cache_reuses_grouping() {
    let table = long_table(&["a", "b", "a"]);
    let mut cache = GroupingCache::new();

    let first = cache.get_or_group("toy", &table, "series").unwrap();
    let second = cache.get_or_group("toy", &table, "series").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert!(cache.contains("toy"));
}

#[test]
fn test_cache_regroups_when_table_height_changes() {
    let mut cache = GroupingCache::new();
    let small = long_table(&["a", "b"]);
    let large = long_table(&["a", "b", "c"]);

    let first = cache.get_or_group("toy", &small, "series").unwrap();
    let second = cache.get_or_group("toy", &large, "series").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.len(), 3);
}

#[test]
fn test_cache_invalidation() {
    let mut cache = GroupingCache::new();
    let before = long_table(&["a", "b"]);
    let after = long_table(&["b", "a"]);

    let stale = cache.get_or_group("toy", &before, "series").unwrap();
    // Same height: without invalidation the stale grouping comes back
    let reused = cache.get_or_group("toy", &after, "series").unwrap();
    assert!(Arc::ptr_eq(&stale, &reused));

    assert!(cache.invalidate("toy"));
    assert!(!cache.invalidate("toy"));
    let fresh = cache.get_or_group("toy", &after, "series").unwrap();
    assert_eq!(fresh.groups()[0].id, "b");

    cache.get_or_group("other", &before, "series").unwrap();
    assert_eq!(cache.len(), 2);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_missing_id_column_is_an_error() {
    let table = long_table(&["a"]);
    let mut cache = GroupingCache::new();
    assert!(cache.get_or_group("toy", &table, "id").is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_unordered_series_detection() {
    let table = Table::from_strs(
        &["series", "ts"],
        &[
            vec!["a", "2021-03-01T00:00:00Z"],
            vec!["a", "2021-03-01T01:00:00Z"],
            vec!["b", "2021-03-02 10:00"],
            vec!["b", "2021-03-02 09:00"],
        ],
    )
    .unwrap();
    let grouping = SeriesGrouping::build(&table, "series").unwrap();
    assert_eq!(
        grouping.unordered_series(&table, "ts", "DATETIME").unwrap(),
        vec!["b".to_string()]
    );
}
