//! Per-session conversion funnel: which stage each session reached and how
//! long it took to get there.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::frames::{event_date, minutes_between};
use crate::load::RawTables;
use polars::prelude::*;

pub const OUTPUT_NAME: &str = "session_funnel";

pub const OUTPUT_COLUMNS: &[&str] = &[
    "session_id",
    "user_id",
    "date",
    "had_pageview",
    "had_product_view",
    "had_add_to_cart",
    "had_order",
    "time_to_cart_minutes",
    "time_to_order_minutes",
];

/// One row per session with four stage flags and the minutes from session
/// start to first cart add / first order (null when the stage was never
/// reached).
///
/// had_pageview is forced to 1: a session is defined by having at least one
/// pageview, so a session row without pageview rows is tolerated as a data
/// anomaly rather than rejected. Stage flags are derived via marker-column
/// left joins against per-session summaries, so multiplicity on the event
/// side cannot duplicate session rows.
pub fn session_funnel(raw: &RawTables, config: &PipelineConfig) -> Result<DataFrame> {
    let product_views = raw
        .pageviews
        .clone()
        .lazy()
        .filter(
            col("path")
                .str()
                .contains_literal(lit(config.product_path_pattern.as_str())),
        )
        .group_by([col("session_id")])
        .agg([lit(1i64).alias("had_product_view")]);

    let cart_stats = raw
        .add_to_cart
        .clone()
        .lazy()
        .group_by([col("session_id")])
        .agg([
            col("time").min().alias("first_cart_time"),
            lit(1i64).alias("had_add_to_cart"),
        ]);

    let order_stats = raw
        .orders
        .clone()
        .lazy()
        .group_by([col("session_id")])
        .agg([
            col("time").min().alias("first_order_time"),
            lit(1i64).alias("had_order"),
        ]);

    let result = raw
        .sessions
        .clone()
        .lazy()
        .select([col("session_id"), col("user_id"), col("time")])
        .with_columns([event_date("time")])
        .join(
            product_views,
            [col("session_id")],
            [col("session_id")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            cart_stats,
            [col("session_id")],
            [col("session_id")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            order_stats,
            [col("session_id")],
            [col("session_id")],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns([
            lit(1).cast(DataType::Int64).alias("had_pageview"),
            col("had_product_view")
                .fill_null(lit(0))
                .cast(DataType::Int64),
            col("had_add_to_cart")
                .fill_null(lit(0))
                .cast(DataType::Int64),
            col("had_order").fill_null(lit(0)).cast(DataType::Int64),
            minutes_between(col("first_cart_time"), col("time")).alias("time_to_cart_minutes"),
            minutes_between(col("first_order_time"), col("time")).alias("time_to_order_minutes"),
        ])
        .select(OUTPUT_COLUMNS.iter().map(|c| col(c)).collect::<Vec<_>>())
        .sort_by_exprs(vec![col("date"), col("session_id")], SortMultipleOptions::default())
        .collect()?;

    Ok(result)
}
