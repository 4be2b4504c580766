//! # Bench Prep
//!
//! A Rust library that turns raw multi-series datasets into forecasting
//! benchmark artifacts.
//!
//! ## Features
//!
//! - Schema derivation from a feature-role table (id, time, target, covariates)
//! - Rolling five-fold or single train/test splits per series
//! - Per-series standard scaling fitted on training rows only
//! - Train, test-without-target and test-key files, optionally gzip or zip compressed
//! - Wide-to-long reshaping of raw tables
//! - Polars data frames throughout, every column kept as text so untouched cells round-trip unchanged
//!
//! ## Fold Layout
//!
//! Fold `f` of a series of length `L`, with rolling window `W` and forecast
//! length `H`, trains on rows `[0, L - (5 - f) * W - H)` and tests on the `H`
//! rows that follow:
//!
//! ```text
//! fold 1: |-------- train --------|-- test --|.....................|
//! fold 5: |-------------------- train ---------------|-- test --|
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bench_prep::config::RunConfig;
//! use bench_prep::pipeline::Pipeline;
//!
//! # fn main() -> bench_prep::Result<()> {
//! // Load the run configuration
//! let config = RunConfig::load_toml("run.toml")?;
//!
//! // Prepare every enabled dataset
//! let mut pipeline = Pipeline::from_config(config)?;
//! let report = pipeline.run(None)?;
//!
//! println!("prepared {} datasets", report.prepared.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Lower-level use
//!
//! ```rust
//! use bench_prep::assemble::{prepare_splits, ArtifactAssembler, MemorySink};
//! use bench_prep::folds::SplitMode;
//! use bench_prep::grouping::SeriesGrouping;
//! use bench_prep::scaling::PerSeriesScaler;
//! use bench_prep::schema::{SchemaFields, FieldDescriptor, Schema};
//! use bench_prep::config::DatasetMetadata;
//! use bench_prep::table::Table;
//!
//! # fn main() -> bench_prep::Result<()> {
//! let table = Table::from_strs(
//!     &["id", "t", "y"],
//!     &[
//!         vec!["a", "1", "1"],
//!         vec!["a", "2", "2"],
//!         vec!["a", "3", "3"],
//!     ],
//! )?;
//! let field = |name: &str| FieldDescriptor {
//!     name: name.to_string(),
//!     description: String::new(),
//!     data_type: "INT".to_string(),
//!     example: 1.into(),
//! };
//! let fields = SchemaFields {
//!     id_field: field("id"),
//!     time_field: Some(field("t")),
//!     forecast_target: field("y"),
//!     past_covariates: vec![],
//!     future_covariates: vec![],
//!     static_covariates: vec![],
//! };
//! let schema = Schema::from_parts(&DatasetMetadata::named("demo"), fields, 1)?;
//!
//! let grouping = SeriesGrouping::build(&table, "id")?;
//! let splits = prepare_splits(
//!     "demo_forecast_len_1",
//!     &table,
//!     &schema,
//!     &grouping,
//!     SplitMode::SingleSplit,
//!     PerSeriesScaler::default(),
//!     false,
//! )?;
//!
//! let mut sink = MemorySink::new();
//! ArtifactAssembler::new(&schema).write("demo_forecast_len_1", &table, &splits, &mut sink)?;
//! assert_eq!(sink.get("demo_forecast_len_1_test_key").map(|t| t.height()), Some(1));
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod config;
pub mod error;
pub mod folds;
pub mod grouping;
pub mod pipeline;
pub mod reshape;
pub mod scaling;
pub mod schema;
pub mod table;

// Re-export main types for convenience
pub use assemble::{ArtifactAssembler, ArtifactSink, Artifacts, DirectorySink, MemorySink};
pub use config::{DatasetMetadata, FeatureRole, RunConfig};
pub use error::{PrepError, Result};
pub use folds::{FoldBoundary, FoldConfig, SplitMode};
pub use grouping::{GroupingCache, SeriesGrouping};
pub use pipeline::{Pipeline, RunReport};
pub use scaling::{PerSeriesScaler, ZeroVariancePolicy};
pub use schema::{Schema, SchemaBuilder};
pub use table::{Compression, Table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
