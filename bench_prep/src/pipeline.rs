//! End-to-end preparation of benchmark datasets
//!
//! For every enabled dataset and every configured forecast length the
//! pipeline writes, into `{output_dir}/{name}_forecast_len_{H}/`:
//!
//! - the main dataset as `{name}_forecast_len_{H}.csv.gz` (once)
//! - the schema document `{name}_forecast_len_{H}_schema.json`
//! - train, test and test-key files for each fold, or for the single split

use crate::assemble::{prepare_splits, ArtifactAssembler, ArtifactSink, ArtifactSummary, DirectorySink};
use crate::config::{DatasetMetadata, FeatureRole, RunConfig};
use crate::error::{PrepError, Result};
use crate::folds::SplitMode;
use crate::grouping::GroupingCache;
use crate::reshape;
use crate::scaling::PerSeriesScaler;
use crate::schema::{Schema, SchemaBuilder};
use crate::table::{Compression, Table};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Emit the artifacts of one split of a dataset
///
/// `cache_key` names the dataset in `cache`; the table must not change
/// between calls sharing a key.
#[allow(clippy::too_many_arguments)]
pub fn prepare_variant(
    table: &Table,
    schema: &Schema,
    dataset: &str,
    mode: SplitMode,
    scaler: PerSeriesScaler,
    parallel: bool,
    cache: &mut GroupingCache,
    sink: &mut dyn ArtifactSink,
) -> Result<ArtifactSummary> {
    let variant = mode.variant_name(dataset, schema.forecast_length);
    let grouping = cache.get_or_group(dataset, table, schema.id_name())?;

    let splits = prepare_splits(&variant, table, schema, &grouping, mode, scaler, parallel)?;
    ArtifactAssembler::new(schema).write(&variant, table, &splits, sink)
}

/// Locate the raw file of a dataset: `.csv`, `.csv.gz` or `.zip`
pub fn find_raw_dataset(raw_dir: &Path, name: &str) -> Result<PathBuf> {
    let candidates = [
        Compression::None.file_name(name),
        Compression::Gzip.file_name(name),
        format!("{}.zip", name),
    ];
    candidates
        .iter()
        .map(|file| raw_dir.join(file))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            PrepError::DataError(format!(
                "No raw file for dataset '{}' in {}",
                name,
                raw_dir.display()
            ))
        })
}

/// Preparation of a single dataset
#[derive(Debug, Clone, Copy)]
pub struct DatasetJob<'a> {
    config: &'a RunConfig,
    metadata: &'a DatasetMetadata,
    roles: &'a [FeatureRole],
}

impl<'a> DatasetJob<'a> {
    pub fn new(config: &'a RunConfig, metadata: &'a DatasetMetadata, roles: &'a [FeatureRole]) -> Self {
        Self {
            config,
            metadata,
            roles,
        }
    }

    /// Raw table, unpivoted when the dataset has a wide layout
    pub fn load(&self) -> Result<Table> {
        let path = find_raw_dataset(&self.config.raw_dir, &self.metadata.name)?;
        let raw = Table::read_csv(&path)?;
        info!(
            dataset = %self.metadata.name,
            path = %path.display(),
            rows = raw.height(),
            "loaded raw dataset"
        );
        match self.config.wide_layout(&self.metadata.name) {
            Some(layout) => reshape::apply_layout(&raw, layout),
            None => Ok(raw),
        }
    }

    /// Directory of one forecast-length variant
    pub fn variant_dir(&self, forecast_length: usize) -> PathBuf {
        self.config.output_dir.join(format!(
            "{}_forecast_len_{}",
            self.metadata.name, forecast_length
        ))
    }

    /// Prepare every forecast length and split of the dataset
    pub fn run(&self, table: &Table, cache: &mut GroupingCache) -> Result<Vec<ArtifactSummary>> {
        let name = self.metadata.name.as_str();

        // Everything that can reject the dataset outright happens before the first write
        let fields = SchemaBuilder::new(self.roles).fields(name, table)?;
        let modes = SplitMode::for_window(self.metadata.kfold_roll_window_size)?;
        cache.invalidate(name);
        let grouping = cache.get_or_group(name, table, &fields.id_field.name)?;
        if let Some(time) = &fields.time_field {
            let unordered = grouping.unordered_series(table, &time.name, &time.data_type)?;
            if !unordered.is_empty() {
                warn!(
                    dataset = name,
                    count = unordered.len(),
                    first = %unordered[0],
                    "series are not ordered by time; splits follow row order"
                );
            }
        }

        let scaler = PerSeriesScaler::new(self.config.zero_variance);
        let mut summaries = Vec::new();

        for &forecast_length in &self.config.forecast_lengths {
            let schema = Schema::from_parts(self.metadata, fields.clone(), forecast_length)?;
            let dir = self.variant_dir(forecast_length);
            let mut sink = DirectorySink::new(&dir, self.config.compression)?;

            let main_path = dir.join(Compression::Gzip.file_name(&format!(
                "{}_forecast_len_{}",
                name, forecast_length
            )));
            if main_path.exists() {
                info!(path = %main_path.display(), "main dataset already present");
            } else {
                table.save(&main_path, Compression::Gzip)?;
            }

            schema.save_json(&dir, name)?;

            for &mode in &modes {
                let summary = prepare_variant(
                    table,
                    &schema,
                    name,
                    mode,
                    scaler,
                    self.config.parallel,
                    cache,
                    &mut sink,
                )?;
                info!(
                    variant = %summary.variant,
                    series = summary.series,
                    train_rows = summary.train_rows,
                    test_rows = summary.test_rows,
                    "prepared variant"
                );
                summaries.push(summary);
            }
        }

        Ok(summaries)
    }
}

/// Outcome of a pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Datasets prepared without error
    pub prepared: Vec<String>,
    /// Datasets disabled in the metadata table
    pub skipped: Vec<String>,
    /// Datasets that failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl RunReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            prepared: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Whether every enabled dataset was prepared
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Prepares all datasets of a run configuration
#[derive(Debug)]
pub struct Pipeline {
    config: RunConfig,
    metadata: Vec<DatasetMetadata>,
    roles: Vec<FeatureRole>,
    cache: GroupingCache,
}

impl Pipeline {
    pub fn new(config: RunConfig, metadata: Vec<DatasetMetadata>, roles: Vec<FeatureRole>) -> Self {
        Self {
            config,
            metadata,
            roles,
            cache: GroupingCache::new(),
        }
    }

    /// Validate the configuration and load the metadata and feature tables it names
    pub fn from_config(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let metadata = DatasetMetadata::load(&config.dataset_metadata_path)?;
        let roles = FeatureRole::load(&config.feature_config_path)?;
        info!(
            datasets = metadata.len(),
            features = roles.len(),
            "loaded dataset configuration"
        );
        Ok(Self::new(config, metadata, roles))
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn metadata(&self) -> &[DatasetMetadata] {
        &self.metadata
    }

    /// Prepare every enabled dataset, or only `only` when given
    ///
    /// A failing dataset is recorded in the report and the run moves on.
    /// Naming a dataset that is not in the metadata table is an error.
    pub fn run(&mut self, only: Option<&str>) -> Result<RunReport> {
        if let Some(name) = only {
            if !self.metadata.iter().any(|m| m.name == name) {
                return Err(PrepError::ConfigError(format!(
                    "Dataset '{}' is not in the metadata table",
                    name
                )));
            }
        }

        let mut report = RunReport::start();

        for metadata in &self.metadata {
            if only.is_some_and(|name| name != metadata.name) {
                continue;
            }
            if !metadata.use_dataset {
                warn!(dataset = %metadata.name, "dataset disabled, skipping");
                report.skipped.push(metadata.name.clone());
                continue;
            }

            info!(dataset = %metadata.name, "processing dataset");
            let job = DatasetJob::new(&self.config, metadata, &self.roles);
            let outcome = job.load().and_then(|table| job.run(&table, &mut self.cache));
            self.cache.invalidate(&metadata.name);

            match outcome {
                Ok(summaries) => {
                    info!(
                        dataset = %metadata.name,
                        variants = summaries.len(),
                        "dataset prepared"
                    );
                    report.prepared.push(metadata.name.clone());
                }
                Err(err) => {
                    error!(dataset = %metadata.name, error = %err, "dataset failed");
                    report.failed.push((metadata.name.clone(), err.to_string()));
                }
            }
        }

        report.finished_at = Utc::now();
        Ok(report)
    }
}
