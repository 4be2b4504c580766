use std::path::PathBuf;

use anyhow::Context as _;
use bench_prep::config::RunConfig;
use bench_prep::pipeline::Pipeline;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "prepare-datasets", version, about = "Prepare forecasting benchmark datasets")]
struct Args {
    /// Run configuration (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Prepare only this dataset.
    #[arg(long)]
    dataset: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let config = RunConfig::load_toml(&args.config)
        .with_context(|| format!("loading run config {}", args.config.display()))?;
    let mut pipeline = Pipeline::from_config(config).context("loading dataset configuration")?;
    let report = pipeline
        .run(args.dataset.as_deref())
        .context("running preparation")?;

    let elapsed = report.finished_at - report.started_at;
    println!("prepared={}", report.prepared.len());
    println!("skipped={}", report.skipped.len());
    println!("failed={}", report.failed.len());
    println!("elapsed_ms={}", elapsed.num_milliseconds());
    for (name, message) in &report.failed {
        eprintln!("{}: {}", name, message);
    }

    if !report.is_success() {
        anyhow::bail!("{} dataset(s) failed", report.failed.len());
    }
    Ok(())
}
