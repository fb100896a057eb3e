use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopmetrics::config::PipelineConfig;
use shopmetrics::pipeline;
use shopmetrics::sample::{self, SampleConfig};

#[derive(Parser)]
#[command(name = "shopmetrics")]
#[command(about = "Batch aggregation pipeline for e-commerce event tables")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline: load raw CSVs, aggregate, write summary tables
    Run {
        /// Path to a JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory holding the raw CSV tables (default: raw_data)
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Directory the summary tables are written to
        /// (default: aggregated_data)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Only keep events on or after this date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// Only keep events on or before this date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<NaiveDate>,

        /// Reference date for recency scoring (defaults to today)
        #[arg(long)]
        reference_date: Option<NaiveDate>,
    },
    /// Generate a seeded synthetic raw dataset
    Generate {
        /// Directory the raw CSV tables are written to
        #[arg(long, default_value = "data/raw")]
        out_dir: PathBuf,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 200)]
        users: usize,

        #[arg(long, default_value_t = 1000)]
        sessions: usize,

        /// Number of calendar days the events span
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
}

/// Flags passed on the command line win over the config file; flags left
/// unset keep whatever the file (or the default) says.
fn apply_run_flags(
    mut config: PipelineConfig,
    raw_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    reference_date: Option<NaiveDate>,
) -> PipelineConfig {
    if let Some(dir) = raw_dir {
        config.raw_dir = dir;
    }
    if let Some(dir) = out_dir {
        config.out_dir = dir;
    }
    if start_date.is_some() {
        config.start_date = start_date;
    }
    if end_date.is_some() {
        config.end_date = end_date;
    }
    if reference_date.is_some() {
        config.reference_date = reference_date;
    }
    config
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Run {
            config,
            raw_dir,
            out_dir,
            start_date,
            end_date,
            reference_date,
        } => {
            let config = match config {
                Some(path) => PipelineConfig::load(&path)?,
                None => PipelineConfig::default(),
            };
            let config = apply_run_flags(
                config,
                raw_dir,
                out_dir,
                start_date,
                end_date,
                reference_date,
            );

            let report = pipeline::run_pipeline(&config)?;
            for (name, rows) in &report.table_rows {
                info!("{name}: {rows} rows");
            }
            info!("pipeline finished in {:.2?}", report.elapsed);
        }
        Command::Generate {
            out_dir,
            seed,
            users,
            sessions,
            days,
        } => {
            let config = SampleConfig {
                seed,
                num_users: users,
                num_sessions: sessions,
                days,
                ..SampleConfig::default()
            };
            let data = sample::generate(&config)?;
            data.write(&out_dir)?;
            info!("sample data written to {}", out_dir.display());
        }
    }

    Ok(())
}
