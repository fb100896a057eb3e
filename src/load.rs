use crate::config::PipelineConfig;
use crate::error::Result;
use crate::schema::{self, TableDescriptor};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// The eight validated raw tables, loaded fully into memory for one batch
/// run. Aggregators receive this struct by shared reference and never
/// mutate it.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub users: DataFrame,
    pub sessions: DataFrame,
    pub orders: DataFrame,
    pub order_items: DataFrame,
    pub add_to_cart: DataFrame,
    pub pageviews: DataFrame,
    pub scrolls: DataFrame,
    pub clicks: DataFrame,
}

impl RawTables {
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        info!("loading raw tables from {}", config.raw_dir.display());
        Ok(Self {
            users: load_table(config, &schema::USERS)?,
            sessions: load_table(config, &schema::SESSIONS)?,
            orders: load_table(config, &schema::ORDERS)?,
            order_items: load_table(config, &schema::ORDER_ITEMS)?,
            add_to_cart: load_table(config, &schema::ADD_TO_CART)?,
            pageviews: load_table(config, &schema::PAGEVIEWS)?,
            scrolls: load_table(config, &schema::SCROLLS)?,
            clicks: load_table(config, &schema::CLICKS)?,
        })
    }
}

/// Load one raw CSV, validate its schema, parse timestamps strictly and
/// apply the configured date-range filter.
fn load_table(config: &PipelineConfig, desc: &TableDescriptor) -> Result<DataFrame> {
    let path = config.raw_dir.join(desc.file_name);

    let df = LazyCsvReader::new(&path)
        .with_has_header(true)
        .with_infer_schema_length(Some(500))
        .finish()?
        .collect()?;

    let df = schema::validate_columns(df, desc)?;
    let df = schema::parse_timestamps(df, desc, &config.timestamp_format)?;
    let df = filter_date_range(df, desc, config)?;

    if df.height() == 0 {
        warn!("table '{}' is empty; dependent outputs will be empty", desc.name);
    } else {
        debug!("loaded '{}': {} rows", desc.name, df.height());
    }
    Ok(df)
}

fn filter_date_range(
    df: DataFrame,
    desc: &TableDescriptor,
    config: &PipelineConfig,
) -> Result<DataFrame> {
    let Some(ts_col) = desc.timestamp_columns.first() else {
        return Ok(df);
    };
    if config.start_date.is_none() && config.end_date.is_none() {
        return Ok(df);
    }

    let event_date = col(ts_col).cast(DataType::Date);
    let mut predicate = lit(true);
    if let Some(start) = config.start_date {
        predicate = predicate.and(event_date.clone().gt_eq(lit(start)));
    }
    if let Some(end) = config.end_date {
        predicate = predicate.and(event_date.lt_eq(lit(end)));
    }

    Ok(df.lazy().filter(predicate).collect()?)
}
