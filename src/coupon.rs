//! Day × coupon usage, discount cost and attributed revenue.

use crate::error::Result;
use crate::frames::{event_date, pct_or_null, ratio_or_zero};
use crate::load::RawTables;
use polars::prelude::*;

pub const OUTPUT_NAME: &str = "coupon_performance";

pub const OUTPUT_COLUMNS: &[&str] = &[
    "date",
    "coupon_code",
    "usage_count",
    "total_discount_given",
    "total_revenue",
    "avg_order_value",
    "discount_percentage",
];

/// One row per (date, coupon) that was actually used. Orders with a null or
/// empty coupon code are plain no-coupon orders and are excluded outright,
/// so every output row has usage_count >= 1.
pub fn coupon_performance(raw: &RawTables) -> Result<DataFrame> {
    let result = raw
        .orders
        .clone()
        .lazy()
        .filter(
            col("coupon_code")
                .is_not_null()
                .and(col("coupon_code").neq(lit(""))),
        )
        .with_columns([event_date("time")])
        .group_by([col("date"), col("coupon_code")])
        .agg([
            col("order_id").n_unique().alias("usage_count"),
            col("discount").sum().round(2).alias("total_discount_given"),
            col("total_price").sum().round(2).alias("total_revenue"),
        ])
        .with_columns([
            col("usage_count").cast(DataType::Int64),
            ratio_or_zero(col("total_revenue"), col("usage_count")).alias("avg_order_value"),
            pct_or_null(col("total_discount_given"), col("total_revenue"))
                .alias("discount_percentage"),
        ])
        .select(OUTPUT_COLUMNS.iter().map(|c| col(c)).collect::<Vec<_>>())
        .sort_by_exprs(
            vec![col("date"), col("usage_count"), col("coupon_code")],
            SortMultipleOptions::default().with_order_descendings([false, true, false]),
        )
        .collect()?;

    Ok(result)
}
