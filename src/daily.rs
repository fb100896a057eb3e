//! Day-grain business KPIs for the executive dashboard.

use crate::error::Result;
use crate::frames::{event_date, pct_or_zero, ratio_or_zero};
use crate::load::RawTables;
use polars::prelude::*;

pub const OUTPUT_NAME: &str = "daily_business_metrics";

pub const OUTPUT_COLUMNS: &[&str] = &[
    "date",
    "total_revenue",
    "total_orders",
    "total_sessions",
    "total_users",
    "conversion_rate",
    "avg_order_value",
    "new_customers",
    "repeat_customers",
];

/// One row per calendar date with sessions present. Days with sessions but
/// no orders report zero revenue/orders; all counts are distinct-identifier
/// counts, never row counts.
pub fn daily_business_metrics(raw: &RawTables) -> Result<DataFrame> {
    let sessions_daily = raw
        .sessions
        .clone()
        .lazy()
        .with_columns([event_date("time")])
        .group_by([col("date")])
        .agg([
            col("session_id").n_unique().alias("total_sessions"),
            col("user_id").n_unique().alias("total_users"),
        ]);

    let orders_daily = raw
        .orders
        .clone()
        .lazy()
        .with_columns([event_date("time")])
        .group_by([col("date")])
        .agg([
            col("total_price").sum().round(2).alias("total_revenue"),
            col("order_id").n_unique().alias("total_orders"),
        ]);

    // Orders joined to the buyer's purchase-history flag; an order whose
    // user_id has no user row keeps a null flag and lands in neither count.
    let orders_with_user = raw
        .orders
        .clone()
        .lazy()
        .with_columns([event_date("time")])
        .join(
            raw.users
                .clone()
                .lazy()
                .select([col("user_id"), col("has_purchase_last_year")]),
            [col("user_id")],
            [col("user_id")],
            JoinArgs::new(JoinType::Left),
        );

    let new_daily = orders_with_user
        .clone()
        .filter(col("has_purchase_last_year").eq(lit(0)))
        .group_by([col("date")])
        .agg([col("user_id").n_unique().alias("new_customers")]);

    let repeat_daily = orders_with_user
        .filter(col("has_purchase_last_year").eq(lit(1)))
        .group_by([col("date")])
        .agg([col("user_id").n_unique().alias("repeat_customers")]);

    let conversion_rate = pct_or_zero(col("total_orders"), col("total_sessions"));
    let conversion_rate = when(conversion_rate.clone().gt(lit(100.0)))
        .then(lit(100.0))
        .otherwise(conversion_rate)
        .alias("conversion_rate");

    let result = sessions_daily
        .join(
            orders_daily,
            [col("date")],
            [col("date")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            new_daily,
            [col("date")],
            [col("date")],
            JoinArgs::new(JoinType::Left),
        )
        .join(
            repeat_daily,
            [col("date")],
            [col("date")],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns([
            col("total_revenue").fill_null(lit(0.0)),
            col("total_orders").fill_null(lit(0)).cast(DataType::Int64),
            col("total_sessions").cast(DataType::Int64),
            col("total_users").cast(DataType::Int64),
            col("new_customers").fill_null(lit(0)).cast(DataType::Int64),
            col("repeat_customers")
                .fill_null(lit(0))
                .cast(DataType::Int64),
        ])
        .with_columns([
            conversion_rate,
            ratio_or_zero(col("total_revenue"), col("total_orders")).alias("avg_order_value"),
        ])
        .select(OUTPUT_COLUMNS.iter().map(|c| col(c)).collect::<Vec<_>>())
        .sort_by_exprs(vec![col("date")], SortMultipleOptions::default())
        .collect()?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{empty_fixture, f64_at, raw_fixture};

    #[test]
    fn per_day_totals_use_distinct_counts() {
        let out = daily_business_metrics(&raw_fixture()).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(out.get_column_names(), OUTPUT_COLUMNS);

        // 2026-02-01: two sessions, two orders, revenue 109.99 + 49.98.
        assert_eq!(f64_at(&out, "total_revenue", 0), Some(159.97));
        let orders = out.column("total_orders").unwrap().i64().unwrap();
        assert_eq!(orders.get(0), Some(2));
        let sessions = out.column("total_sessions").unwrap().i64().unwrap();
        assert_eq!(sessions.get(0), Some(2));
        assert_eq!(f64_at(&out, "conversion_rate", 0), Some(100.0));
        assert_eq!(f64_at(&out, "avg_order_value", 0), Some(79.99));

        // 2026-02-02: sessions s3+s4, one order.
        assert_eq!(sessions.get(1), Some(2));
        assert_eq!(orders.get(1), Some(1));
        assert_eq!(f64_at(&out, "total_revenue", 1), Some(60.0));
        assert_eq!(f64_at(&out, "conversion_rate", 1), Some(50.0));
    }

    #[test]
    fn new_and_repeat_customers_split_on_purchase_history() {
        let out = daily_business_metrics(&raw_fixture()).unwrap();
        let new = out.column("new_customers").unwrap().i64().unwrap();
        let repeat = out.column("repeat_customers").unwrap().i64().unwrap();
        // u1 (flag 0) orders on day 1, u2 (flag 1) orders on both days.
        assert_eq!(new.get(0), Some(1));
        assert_eq!(repeat.get(0), Some(1));
        assert_eq!(new.get(1), Some(0));
        assert_eq!(repeat.get(1), Some(1));
    }

    #[test]
    fn day_without_orders_reports_zero_revenue() {
        let mut raw = raw_fixture();
        raw.orders = raw.orders.clear();
        let out = daily_business_metrics(&raw).unwrap();
        assert_eq!(out.height(), 2);
        assert_eq!(f64_at(&out, "total_revenue", 0), Some(0.0));
        assert_eq!(f64_at(&out, "conversion_rate", 0), Some(0.0));
        assert_eq!(f64_at(&out, "avg_order_value", 0), Some(0.0));
    }

    #[test]
    fn empty_inputs_yield_empty_output() {
        let out = daily_business_metrics(&empty_fixture()).unwrap();
        assert_eq!(out.height(), 0);
        assert_eq!(out.get_column_names(), OUTPUT_COLUMNS);
    }
}
