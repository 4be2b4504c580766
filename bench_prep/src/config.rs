//! Run configuration and the metadata tables that drive it
//!
//! Three inputs configure a run:
//!
//! - a TOML [`RunConfig`] naming directories, forecast lengths and output options,
//! - the dataset metadata table (one [`DatasetMetadata`] row per dataset),
//! - the feature-role table (one [`FeatureRole`] row per field per dataset).

use crate::error::{PrepError, Result};
use crate::scaling::ZeroVariancePolicy;
use crate::table::{is_missing, Compression, Table};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Remove surrounding whitespace and one layer of matching quotes
pub fn strip_quotes(cell: &str) -> &str {
    let trimmed = cell.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim();
        }
    }
    trimmed
}

/// One row of the dataset metadata table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub use_dataset: bool,
    pub name: String,
    pub title: String,
    pub description: String,
    pub model_category: String,
    pub encoding: String,
    pub frequency: String,
    /// Rolling window between folds; `None` selects single-split mode
    pub kfold_roll_window_size: Option<usize>,
}

impl DatasetMetadata {
    /// Enabled dataset with the given name, empty descriptive fields and no rolling window
    pub fn named(name: &str) -> Self {
        Self {
            use_dataset: true,
            name: name.to_string(),
            title: name.to_string(),
            description: String::new(),
            model_category: "forecasting".to_string(),
            encoding: "utf-8".to_string(),
            frequency: String::new(),
            kfold_roll_window_size: None,
        }
    }

    /// Parse every row of a metadata table
    pub fn from_table(table: &Table) -> Result<Vec<DatasetMetadata>> {
        let cols = MetadataColumns::locate(table)?;
        (0..table.height()).map(|i| cols.parse_row(i)).collect()
    }

    /// Load the metadata table from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<DatasetMetadata>> {
        Self::from_table(&Table::read_csv(path)?)
    }
}

/// Cells of a column the configuration table cannot do without
fn required_column<'a>(table: &'a Table, name: &str, source: &str) -> Result<Vec<&'a str>> {
    if !table.has_column(name) {
        return Err(PrepError::ConfigError(format!(
            "{} is missing column '{}'",
            source, name
        )));
    }
    table.column(name)
}

struct MetadataColumns<'a> {
    use_dataset: Vec<&'a str>,
    name: Vec<&'a str>,
    title: Vec<&'a str>,
    description: Vec<&'a str>,
    model_category: Vec<&'a str>,
    encoding: Vec<&'a str>,
    frequency: Vec<&'a str>,
    roll_window: Option<Vec<&'a str>>,
}

impl<'a> MetadataColumns<'a> {
    fn locate(table: &'a Table) -> Result<Self> {
        let need = |name: &str| required_column(table, name, "Dataset metadata");
        Ok(Self {
            use_dataset: need("use_dataset")?,
            name: need("name")?,
            title: need("title")?,
            description: need("description")?,
            model_category: need("model_category")?,
            encoding: need("encoding")?,
            frequency: need("frequency")?,
            roll_window: if table.has_column("kfold_roll_window_size") {
                Some(table.column("kfold_roll_window_size")?)
            } else {
                None
            },
        })
    }

    fn parse_row(&self, line: usize) -> Result<DatasetMetadata> {
        let cell = |column: &[&str]| strip_quotes(column[line]).to_string();

        let use_dataset = match strip_quotes(self.use_dataset[line]) {
            "1" | "1.0" | "true" | "True" => true,
            "0" | "0.0" | "false" | "False" | "" => false,
            other => {
                return Err(PrepError::ConfigError(format!(
                    "Metadata row {}: use_dataset must be 0 or 1, got '{}'",
                    line, other
                )))
            }
        };

        let kfold_roll_window_size = match self.roll_window.as_ref().map(|c| strip_quotes(c[line])) {
            None => None,
            Some(raw) if is_missing(raw) => None,
            Some(raw) => Some(parse_count(raw).ok_or_else(|| {
                PrepError::ConfigError(format!(
                    "Metadata row {}: kfold_roll_window_size '{}' is not a whole number",
                    line, raw
                ))
            })?),
        };

        Ok(DatasetMetadata {
            use_dataset,
            name: cell(&self.name),
            title: cell(&self.title),
            description: cell(&self.description),
            model_category: cell(&self.model_category),
            encoding: cell(&self.encoding),
            frequency: cell(&self.frequency),
            kfold_roll_window_size,
        })
    }
}

/// Parse `"12"` or `"12.0"` as a count
fn parse_count(raw: &str) -> Option<usize> {
    if let Ok(n) = raw.parse::<usize>() {
        return Some(n);
    }
    let f: f64 = raw.parse().ok()?;
    (f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64).then_some(f as usize)
}

/// One row of the feature-role table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRole {
    /// Dataset the field belongs to
    pub name: String,
    /// Role of the field, e.g. `id`, `target`, `past_covariate`
    pub field_type: String,
    pub field_name: String,
    pub field_description: String,
    pub data_type: String,
}

impl FeatureRole {
    /// Parse every row of a feature-role table, stripping quotes from each cell
    pub fn from_table(table: &Table) -> Result<Vec<FeatureRole>> {
        let need = |name: &str| required_column(table, name, "Feature config");
        let name = need("name")?;
        let field_type = need("field_type")?;
        let field_name = need("field_name")?;
        let field_description = need("field_description")?;
        let data_type = need("data_type")?;

        Ok((0..table.height())
            .map(|i| FeatureRole {
                name: strip_quotes(name[i]).to_string(),
                field_type: strip_quotes(field_type[i]).to_string(),
                field_name: strip_quotes(field_name[i]).to_string(),
                field_description: strip_quotes(field_description[i]).to_string(),
                data_type: strip_quotes(data_type[i]).to_string(),
            })
            .collect())
    }

    /// Load the feature-role table from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<FeatureRole>> {
        Self::from_table(&Table::read_csv(path)?)
    }
}

/// A raw dataset stored wide: one time column plus one column per series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WideLayout {
    /// Dataset name as in the metadata table
    pub name: String,
    /// Column holding the timestamps
    #[serde(default = "default_time_column")]
    pub time_column: String,
    /// Prefix added to every series name, e.g. `ser_`
    #[serde(default)]
    pub series_prefix: String,
}

fn default_time_column() -> String {
    "date".to_string()
}

/// Top-level run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory holding `{name}.csv[.gz|.zip]` raw datasets
    pub raw_dir: PathBuf,
    /// Directory receiving one sub-directory per dataset variant
    pub output_dir: PathBuf,
    /// Path of the dataset metadata CSV
    pub dataset_metadata_path: PathBuf,
    /// Path of the feature-role CSV
    pub feature_config_path: PathBuf,
    /// Forecast lengths to prepare for every dataset
    pub forecast_lengths: Vec<usize>,
    /// Compression of the train/test/test-key files
    #[serde(default)]
    pub compression: Compression,
    /// What to do with series whose training window is constant
    #[serde(default)]
    pub zero_variance: ZeroVariancePolicy,
    /// Scale series on the rayon thread pool
    #[serde(default)]
    pub parallel: bool,
    /// Datasets whose raw file must be unpivoted first
    #[serde(default, rename = "wide")]
    pub wide_layouts: Vec<WideLayout>,
}

impl RunConfig {
    /// Load configuration from TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    /// Check the configuration before any work starts
    pub fn validate(&self) -> Result<()> {
        if self.forecast_lengths.is_empty() {
            return Err(PrepError::ConfigError(
                "At least one forecast length is required".to_string(),
            ));
        }
        if self.forecast_lengths.contains(&0) {
            return Err(PrepError::ConfigError(
                "Forecast lengths must be greater than zero".to_string(),
            ));
        }
        let mut sorted = self.forecast_lengths.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != self.forecast_lengths.len() {
            return Err(PrepError::ConfigError(
                "Forecast lengths must not repeat".to_string(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(PrepError::ConfigError(
                "Output directory cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Wide layout declared for a dataset, if any
    pub fn wide_layout(&self, dataset: &str) -> Option<&WideLayout> {
        self.wide_layouts.iter().find(|w| w.name == dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("  \"series_id\" "), "series_id");
        assert_eq!(strip_quotes("'value'"), "value");
        assert_eq!(strip_quotes("plain"), "plain");
        assert_eq!(strip_quotes("\""), "\"");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count("1.5"), None);
        assert_eq!(parse_count("-3"), None);
    }

    #[test]
    fn test_metadata_rows() {
        let table = Table::from_strs(
            &[
                "use_dataset",
                "name",
                "title",
                "description",
                "model_category",
                "encoding",
                "frequency",
                "kfold_roll_window_size",
            ],
            &[
                vec!["1", "sales", "Sales", "Daily sales", "forecasting", "utf-8", "DAILY", "7"],
                vec!["0", "'old'", "Old", "Unused", "forecasting", "utf-8", "HOURLY", ""],
            ],
        )
        .unwrap();

        let rows = DatasetMetadata::from_table(&table).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].use_dataset);
        assert_eq!(rows[0].kfold_roll_window_size, Some(7));
        assert!(!rows[1].use_dataset);
        assert_eq!(rows[1].name, "old");
        assert_eq!(rows[1].kfold_roll_window_size, None);
    }

    #[test]
    fn test_validate_rejects_zero_horizon() {
        let config = RunConfig {
            raw_dir: PathBuf::from("raw"),
            output_dir: PathBuf::from("out"),
            dataset_metadata_path: PathBuf::from("meta.csv"),
            feature_config_path: PathBuf::from("features.csv"),
            forecast_lengths: vec![10, 0],
            compression: Compression::None,
            zero_variance: ZeroVariancePolicy::Fail,
            parallel: false,
            wide_layouts: Vec::new(),
        };
        assert!(matches!(config.validate(), Err(PrepError::ConfigError(_))));
    }
}
