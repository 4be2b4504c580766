//! Train, test and test-key artifacts
//!
//! [`prepare_splits`] cuts every series at its fold boundary and scales its
//! target; [`ArtifactAssembler`] stitches the per-series pieces back
//! together into the three output tables, which are then handed to an
//! [`ArtifactSink`].

use crate::error::Result;
use crate::folds::{FoldBoundary, SplitMode};
use crate::grouping::{SeriesGroup, SeriesGrouping};
use crate::scaling::{format_value, parse_target, PerSeriesScaler};
use crate::schema::Schema;
use crate::table::{Compression, Table};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Train and test pieces of one series for one fold
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSplit {
    pub id: String,
    /// Source rows of the training window
    pub train_rows: Vec<usize>,
    /// Source rows of the test window
    pub test_rows: Vec<usize>,
    /// Scaled target, aligned with `train_rows`
    pub train_target: Vec<Option<f64>>,
    /// Scaled target, aligned with `test_rows`
    pub test_target: Vec<Option<f64>>,
}

/// Split and scale one series
fn split_one(
    target: &[&str],
    group: &SeriesGroup,
    mode: SplitMode,
    forecast_length: usize,
    scaler: PerSeriesScaler,
) -> Result<SeriesSplit> {
    let boundary = FoldBoundary::compute(group.len(), mode, forecast_length)?;
    let train_rows = group.rows[boundary.train_range()].to_vec();
    let test_rows = group.rows[boundary.test_range()].to_vec();

    let cells = |rows: &[usize]| rows.iter().map(|&r| target[r]).collect::<Vec<&str>>();
    let train_values = parse_target(&group.id, &cells(&train_rows))?;
    let test_values = parse_target(&group.id, &cells(&test_rows))?;

    let scaled = scaler.scale(&group.id, &train_values, &test_values)?;

    Ok(SeriesSplit {
        id: group.id.clone(),
        train_rows,
        test_rows,
        train_target: scaled.train,
        test_target: scaled.test,
    })
}

/// Split and scale every series of a dataset for one fold
///
/// Results are in series order whether or not `parallel` is set. Errors carry
/// the variant name and the failing series.
pub fn prepare_splits(
    variant: &str,
    table: &Table,
    schema: &Schema,
    grouping: &SeriesGrouping,
    mode: SplitMode,
    scaler: PerSeriesScaler,
    parallel: bool,
) -> Result<Vec<SeriesSplit>> {
    let target = table.column(schema.target_name())?;
    let forecast_length = schema.forecast_length;

    let run = |group: &SeriesGroup| {
        split_one(&target, group, mode, forecast_length, scaler)
            .map_err(|e| e.located(variant, &group.id))
    };

    if parallel {
        grouping.groups().par_iter().map(run).collect()
    } else {
        grouping.groups().iter().map(run).collect()
    }
}

/// The three output tables of one variant
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    /// All columns, scaled target
    pub train: Table,
    /// Test rows without target and past covariates
    pub test: Table,
    /// Id, time and scaled target of the test rows
    pub test_key: Table,
}

/// Row counts of an emitted variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub variant: String,
    pub series: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl Artifacts {
    /// Hand all three tables to `sink` as `{variant}_train`, `{variant}_test`, `{variant}_test_key`
    pub fn emit(&self, variant: &str, sink: &mut dyn ArtifactSink) -> Result<()> {
        sink.write_table(&format!("{}_train", variant), &self.train)?;
        sink.write_table(&format!("{}_test", variant), &self.test)?;
        sink.write_table(&format!("{}_test_key", variant), &self.test_key)?;
        Ok(())
    }
}

/// Builds output tables from per-series splits
#[derive(Debug, Clone, Copy)]
pub struct ArtifactAssembler<'a> {
    schema: &'a Schema,
}

impl<'a> ArtifactAssembler<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Concatenate the splits in order and derive the three tables
    pub fn assemble(&self, table: &Table, splits: &[SeriesSplit]) -> Result<Artifacts> {
        let target = self.schema.target_name();

        let train_rows: Vec<usize> = splits.iter().flat_map(|s| s.train_rows.iter().copied()).collect();
        let test_rows: Vec<usize> = splits.iter().flat_map(|s| s.test_rows.iter().copied()).collect();
        let train_values: Vec<String> = splits
            .iter()
            .flat_map(|s| s.train_target.iter().map(|v| format_value(*v)))
            .collect();
        let test_values: Vec<String> = splits
            .iter()
            .flat_map(|s| s.test_target.iter().map(|v| format_value(*v)))
            .collect();

        let train = table
            .take_rows(&train_rows)?
            .with_column_values(target, train_values)?;
        let test_full = table
            .take_rows(&test_rows)?
            .with_column_values(target, test_values)?;

        let mut dropped = vec![target];
        dropped.extend(self.schema.past_covariate_names());
        let test = test_full.drop_columns(&dropped)?;

        let mut key_columns = vec![self.schema.id_name()];
        if let Some(time) = self.schema.time_name() {
            key_columns.push(time);
        }
        key_columns.push(target);
        let test_key = test_full.select(&key_columns)?;

        Ok(Artifacts {
            train,
            test,
            test_key,
        })
    }

    /// Assemble and emit one variant, returning its row counts
    pub fn write(
        &self,
        variant: &str,
        table: &Table,
        splits: &[SeriesSplit],
        sink: &mut dyn ArtifactSink,
    ) -> Result<ArtifactSummary> {
        let artifacts = self.assemble(table, splits)?;
        artifacts.emit(variant, sink)?;

        let summary = ArtifactSummary {
            variant: variant.to_string(),
            series: splits.len(),
            train_rows: artifacts.train.height(),
            test_rows: artifacts.test.height(),
        };
        tracing::debug!(
            variant,
            series = summary.series,
            train_rows = summary.train_rows,
            test_rows = summary.test_rows,
            "wrote artifacts"
        );
        Ok(summary)
    }
}

/// Receives named output tables
pub trait ArtifactSink {
    /// Store `table` under `stem` (no extension)
    fn write_table(&mut self, stem: &str, table: &Table) -> Result<()>;
}

/// Writes `{stem}.csv[.gz|.zip]` files into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    compression: Compression,
}

impl DirectorySink {
    /// Create the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P, compression: Compression) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, compression })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a table named `stem` is written to
    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.dir.join(self.compression.file_name(stem))
    }
}

impl ArtifactSink for DirectorySink {
    fn write_table(&mut self, stem: &str, table: &Table) -> Result<()> {
        table.save(self.path_for(stem), self.compression)
    }
}

/// Keeps emitted tables in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub tables: Vec<(String, Table)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table stored under `stem`
    pub fn get(&self, stem: &str) -> Option<&Table> {
        self.tables.iter().find(|(s, _)| s == stem).map(|(_, t)| t)
    }
}

impl ArtifactSink for MemorySink {
    fn write_table(&mut self, stem: &str, table: &Table) -> Result<()> {
        self.tables.push((stem.to_string(), table.clone()));
        Ok(())
    }
}
