//! Day × page traffic, scroll depth and click counts.

use crate::error::Result;
use crate::frames::event_date;
use crate::load::RawTables;
use polars::prelude::*;

pub const OUTPUT_NAME: &str = "page_engagement_metrics";

pub const OUTPUT_COLUMNS: &[&str] = &[
    "date",
    "path",
    "pageviews",
    "unique_users",
    "sessions_with_page",
    "avg_scroll_depth",
    "total_clicks",
];

/// One row per (date, path) that was viewed. Scroll depth averages every
/// sample for that page/day, not just the furthest point reached; it stays
/// null for page/days with no scroll samples (no sample is not depth 0).
pub fn page_engagement_metrics(raw: &RawTables) -> Result<DataFrame> {
    let views = raw
        .pageviews
        .clone()
        .lazy()
        .with_columns([event_date("time")])
        .group_by([col("date"), col("path")])
        .agg([
            len().alias("pageviews"),
            col("user_id").n_unique().alias("unique_users"),
            col("session_id").n_unique().alias("sessions_with_page"),
        ]);

    let scroll_depth = raw
        .scrolls
        .clone()
        .lazy()
        .with_columns([event_date("time")])
        .group_by([col("date"), col("path")])
        .agg([col("scroll_percent")
            .mean()
            .round(2)
            .alias("avg_scroll_depth")]);

    let clicks = raw
        .clicks
        .clone()
        .lazy()
        .with_columns([event_date("time")])
        .group_by([col("date"), col("path")])
        .agg([len().alias("total_clicks")]);

    let result = views
        .join(
            scroll_depth,
            [col("date"), col("path")],
            [col("date"), col("path")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            clicks,
            [col("date"), col("path")],
            [col("date"), col("path")],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns([
            col("pageviews").cast(DataType::Int64),
            col("unique_users").cast(DataType::Int64),
            col("sessions_with_page").cast(DataType::Int64),
            col("total_clicks").fill_null(lit(0)).cast(DataType::Int64),
        ])
        .select(OUTPUT_COLUMNS.iter().map(|c| col(c)).collect::<Vec<_>>())
        .sort_by_exprs(
            vec![col("date"), col("pageviews"), col("path")],
            SortMultipleOptions::default().with_order_descendings([false, true, false]),
        )
        .collect()?;

    Ok(result)
}
