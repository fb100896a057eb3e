//! Session-level marketing attribution: one row per session with its
//! acquisition channel and conversion outcome.

use crate::error::Result;
use crate::frames::{absent_as_null, event_date};
use crate::load::RawTables;
use polars::prelude::*;

pub const OUTPUT_NAME: &str = "session_attribution";

pub const OUTPUT_COLUMNS: &[&str] = &[
    "session_id",
    "user_id",
    "date",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "country",
    "device_type",
    "platform",
    "converted",
    "revenue",
    "order_id",
];

/// Session columns that may be absent from the raw file; they come through
/// as nulls (UTM nulls then resolve to "direct").
const OPTIONAL_SESSION_COLUMNS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "country",
    "device_type",
    "platform",
];

/// Left-joins sessions to orders on session_id. A session with several
/// orders (rare, but not forbidden upstream) sums revenue across them and
/// keeps the earliest order's id; converted is 1 if any order matched.
pub fn session_attribution(raw: &RawTables) -> Result<DataFrame> {
    let orders_per_session = raw
        .orders
        .clone()
        .lazy()
        .sort_by_exprs(vec![col("time")], SortMultipleOptions::default())
        .group_by([col("session_id")])
        .agg([
            col("total_price").sum().round(2).alias("revenue"),
            col("order_id").first().alias("order_id"),
        ]);

    let fill_direct = |name: &str| {
        when(col(name).is_null().or(col(name).eq(lit(""))))
            .then(lit("direct"))
            .otherwise(col(name))
            .alias(name)
    };

    let result = raw
        .sessions
        .clone()
        .lazy()
        .with_columns(absent_as_null(&raw.sessions, OPTIONAL_SESSION_COLUMNS))
        .with_columns([event_date("time")])
        .join(
            orders_per_session,
            [col("session_id")],
            [col("session_id")],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns([
            col("order_id")
                .is_not_null()
                .cast(DataType::Int64)
                .alias("converted"),
            col("revenue").fill_null(lit(0.0)),
            // Sessions without UTM tags are direct traffic.
            fill_direct("utm_source"),
            fill_direct("utm_medium"),
            fill_direct("utm_campaign"),
        ])
        .select(OUTPUT_COLUMNS.iter().map(|c| col(c)).collect::<Vec<_>>())
        .sort_by_exprs(vec![col("date"), col("session_id")], SortMultipleOptions::default())
        .collect()?;

    Ok(result)
}
