//! Orchestration: load and validate the raw tables, run the seven
//! aggregators, and persist the outputs only when every step succeeded.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::load::RawTables;
use crate::{attribution, coupon, daily, engagement, funnel, lifetime, product};
use polars::prelude::*;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// All seven aggregated tables for one run, held in memory until the whole
/// set is known good.
#[derive(Debug, Clone)]
pub struct AggregatedTables {
    pub daily_business_metrics: DataFrame,
    pub session_attribution: DataFrame,
    pub session_funnel: DataFrame,
    pub product_performance_daily: DataFrame,
    pub user_lifetime_metrics: DataFrame,
    pub page_engagement_metrics: DataFrame,
    pub coupon_performance: DataFrame,
}

impl AggregatedTables {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &DataFrame)> {
        [
            (daily::OUTPUT_NAME, &self.daily_business_metrics),
            (attribution::OUTPUT_NAME, &self.session_attribution),
            (funnel::OUTPUT_NAME, &self.session_funnel),
            (product::OUTPUT_NAME, &self.product_performance_daily),
            (lifetime::OUTPUT_NAME, &self.user_lifetime_metrics),
            (engagement::OUTPUT_NAME, &self.page_engagement_metrics),
            (coupon::OUTPUT_NAME, &self.coupon_performance),
        ]
        .into_iter()
    }
}

#[derive(Debug)]
pub struct PipelineReport {
    pub table_rows: Vec<(&'static str, usize)>,
    pub elapsed: Duration,
}

/// Run every aggregator over the validated raw tables.
///
/// The aggregators are mutually independent, so one failing never stops
/// the rest from running; but if any failed, the whole batch is an error
/// naming every failed table, and nothing gets persisted.
pub fn aggregate_all(raw: &RawTables, config: &PipelineConfig) -> Result<AggregatedTables> {
    let mut failures: Vec<(&'static str, PipelineError)> = Vec::new();

    let mut run = |name: &'static str, result: Result<DataFrame>| match result {
        Ok(df) => {
            info!("built {name}: {} rows", df.height());
            Some(df)
        }
        Err(e) => {
            error!("aggregator {name} failed: {e}");
            failures.push((name, e));
            None
        }
    };

    let daily_df = run(daily::OUTPUT_NAME, daily::daily_business_metrics(raw));
    let attribution_df = run(attribution::OUTPUT_NAME, attribution::session_attribution(raw));
    let funnel_df = run(funnel::OUTPUT_NAME, funnel::session_funnel(raw, config));
    let product_df = run(product::OUTPUT_NAME, product::product_performance_daily(raw));
    let lifetime_df = run(
        lifetime::OUTPUT_NAME,
        lifetime::user_lifetime_metrics(raw, config),
    );
    let engagement_df = run(
        engagement::OUTPUT_NAME,
        engagement::page_engagement_metrics(raw),
    );
    let coupon_df = run(coupon::OUTPUT_NAME, coupon::coupon_performance(raw));

    if !failures.is_empty() {
        let tables: Vec<&str> = failures.iter().map(|(name, _)| *name).collect();
        let messages: Vec<String> = failures
            .iter()
            .map(|(name, e)| format!("{name}: {e}"))
            .collect();
        return Err(PipelineError::Aggregation {
            table: tables.join(", "),
            message: messages.join("; "),
        });
    }

    // All seven ran cleanly; the Options are guaranteed filled.
    Ok(AggregatedTables {
        daily_business_metrics: daily_df.expect("checked above"),
        session_attribution: attribution_df.expect("checked above"),
        session_funnel: funnel_df.expect("checked above"),
        product_performance_daily: product_df.expect("checked above"),
        user_lifetime_metrics: lifetime_df.expect("checked above"),
        page_engagement_metrics: engagement_df.expect("checked above"),
        coupon_performance: coupon_df.expect("checked above"),
    })
}

/// Write each aggregated table as `<name>.csv`, fully overwriting any
/// previous run's output.
pub fn write_outputs(tables: &AggregatedTables, config: &PipelineConfig) -> Result<()> {
    std::fs::create_dir_all(&config.out_dir)?;
    for (name, df) in tables.iter() {
        let path = config.out_dir.join(format!("{name}.csv"));
        let mut file = std::fs::File::create(&path)?;
        let mut df = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        info!("wrote {} ({} rows)", path.display(), df.height());
    }
    Ok(())
}

/// Full batch: load, validate, aggregate, write. Validation and aggregation
/// failures abort before anything is written; a run that returns Ok has the
/// complete seven-table output set on disk.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;
    let started = Instant::now();

    let raw = RawTables::load(config)?;
    let tables = aggregate_all(&raw, config)?;
    write_outputs(&tables, config)?;

    let report = PipelineReport {
        table_rows: tables.iter().map(|(name, df)| (name, df.height())).collect(),
        elapsed: started.elapsed(),
    };
    info!("pipeline complete in {:.2?}", report.elapsed);
    Ok(report)
}
