//! Per-user lifetime value and RFM (Recency/Frequency/Monetary)
//! segmentation.
//!
//! Scores use fixed thresholds, not computed percentiles, so two runs over
//! the same data always produce the same scores. The segment label comes
//! from a complete 5x5x5 lookup table built once at startup; every one of
//! the 125 score combinations maps to exactly one label.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::frames::ratio_or_zero;
use crate::load::RawTables;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use polars::prelude::*;

pub const OUTPUT_NAME: &str = "user_lifetime_metrics";

pub const OUTPUT_COLUMNS: &[&str] = &[
    "user_id",
    "first_order_date",
    "last_order_date",
    "total_orders",
    "total_revenue",
    "avg_order_value",
    "days_since_last_order",
    "rfm_recency_score",
    "rfm_frequency_score",
    "rfm_monetary_score",
    "rfm_segment",
    "has_purchase_last_year",
    "has_purchase_last_qtr",
];

/// Ordered recency bands: first band whose upper bound (days since last
/// order, inclusive) covers the value wins; beyond the last band scores 1.
const RECENCY_BANDS: [(i64, u8); 4] = [(30, 5), (90, 4), (180, 3), (365, 2)];

/// Ordered frequency bands: first band whose lower bound (order count,
/// inclusive) is met wins; below the last band scores 1.
const FREQUENCY_BANDS: [(i64, u8); 4] = [(10, 5), (5, 4), (3, 3), (2, 2)];

/// Ordered monetary bands: first band whose lower bound (lifetime revenue,
/// inclusive) is met wins; below the last band scores 1.
const MONETARY_BANDS: [(f64, u8); 4] = [(1000.0, 5), (500.0, 4), (200.0, 3), (50.0, 2)];

pub fn recency_score(days_since_last_order: i64) -> u8 {
    for (max_days, score) in RECENCY_BANDS {
        if days_since_last_order <= max_days {
            return score;
        }
    }
    1
}

pub fn frequency_score(total_orders: i64) -> u8 {
    for (min_orders, score) in FREQUENCY_BANDS {
        if total_orders >= min_orders {
            return score;
        }
    }
    1
}

pub fn monetary_score(total_revenue: f64) -> u8 {
    for (min_revenue, score) in MONETARY_BANDS {
        if total_revenue >= min_revenue {
            return score;
        }
    }
    1
}

/// Ordered segment rules. The final arm has no condition, so the mapping is
/// total over all 125 tuples by construction.
fn classify(r: u8, f: u8, m: u8) -> &'static str {
    if r >= 4 && f >= 4 && m >= 4 {
        "Champion"
    } else if r >= 3 && f >= 4 {
        "Loyal Customer"
    } else if m >= 4 && f <= 2 {
        "Big Spender"
    } else if r >= 3 && f >= 2 {
        "Potential Loyalist"
    } else if r >= 4 && f == 1 {
        "New Customer"
    } else if r <= 2 && f >= 3 {
        "At Risk"
    } else if r == 1 {
        "Lost"
    } else if r == 2 {
        "Needs Attention"
    } else {
        "Regular"
    }
}

lazy_static! {
    /// Full (recency, frequency, monetary) -> label table, 1-based scores.
    static ref SEGMENT_TABLE: [[[&'static str; 5]; 5]; 5] = {
        let mut table = [[[""; 5]; 5]; 5];
        for r in 1..=5u8 {
            for f in 1..=5u8 {
                for m in 1..=5u8 {
                    table[(r - 1) as usize][(f - 1) as usize][(m - 1) as usize] =
                        classify(r, f, m);
                }
            }
        }
        table
    };
}

/// Segment label for a score tuple. Scores outside 1..=5 cannot occur
/// (the band tables only emit 1..=5).
pub fn rfm_segment(r: u8, f: u8, m: u8) -> &'static str {
    SEGMENT_TABLE[(r - 1) as usize][(f - 1) as usize][(m - 1) as usize]
}

/// One row per user with at least one order. Users who never ordered have
/// no RFM profile and are excluded, not zero-filled.
pub fn user_lifetime_metrics(raw: &RawTables, config: &PipelineConfig) -> Result<DataFrame> {
    let per_user = raw
        .orders
        .clone()
        .lazy()
        .group_by([col("user_id")])
        .agg([
            col("time").min().alias("first_order_date"),
            col("time").max().alias("last_order_date"),
            col("order_id").n_unique().alias("total_orders"),
            col("total_price").sum().round(2).alias("total_revenue"),
        ])
        .with_columns([col("total_orders").cast(DataType::Int64)])
        .with_columns([
            ratio_or_zero(col("total_revenue"), col("total_orders")).alias("avg_order_value"),
        ])
        .join(
            raw.users
                .clone()
                .lazy()
                .select([
                    col("user_id"),
                    col("has_purchase_last_year"),
                    col("has_purchase_last_qtr"),
                ]),
            [col("user_id")],
            [col("user_id")],
            JoinArgs::new(JoinType::Left),
        )
        .sort_by_exprs(
            vec![col("total_revenue"), col("user_id")],
            SortMultipleOptions::default().with_order_descendings([true, false]),
        )
        .collect()?;

    let scored = score_users(per_user, config.reference_date())?;

    let result = scored
        .lazy()
        .with_columns([
            col("first_order_date").cast(DataType::Date),
            col("last_order_date").cast(DataType::Date),
        ])
        .select(OUTPUT_COLUMNS.iter().map(|c| col(c)).collect::<Vec<_>>())
        .collect()?;

    Ok(result)
}

/// Row-wise scoring pass: derives days_since_last_order from the reference
/// date and attaches the three scores plus the segment label.
fn score_users(per_user: DataFrame, reference: NaiveDate) -> Result<DataFrame> {
    let height = per_user.height();
    let last_order = per_user.column("last_order_date")?.datetime()?;
    let total_orders = per_user.column("total_orders")?.i64()?;
    let total_revenue = per_user.column("total_revenue")?.f64()?;

    let mut days = Vec::with_capacity(height);
    let mut r_scores = Vec::with_capacity(height);
    let mut f_scores = Vec::with_capacity(height);
    let mut m_scores = Vec::with_capacity(height);
    let mut segments = Vec::with_capacity(height);

    for row in 0..height {
        let last_ms = last_order.get(row).ok_or_else(|| missing_value(row))?;
        let last_date = chrono::DateTime::from_timestamp_millis(last_ms)
            .ok_or_else(|| missing_value(row))?
            .date_naive();
        let orders = total_orders.get(row).ok_or_else(|| missing_value(row))?;
        let revenue = total_revenue.get(row).ok_or_else(|| missing_value(row))?;

        let days_since = (reference - last_date).num_days();
        let r = recency_score(days_since);
        let f = frequency_score(orders);
        let m = monetary_score(revenue);

        days.push(days_since);
        r_scores.push(r as i64);
        f_scores.push(f as i64);
        m_scores.push(m as i64);
        segments.push(rfm_segment(r, f, m));
    }

    let mut scored = per_user;
    scored.hstack_mut(&[
        Series::new("days_since_last_order", days),
        Series::new("rfm_recency_score", r_scores),
        Series::new("rfm_frequency_score", f_scores),
        Series::new("rfm_monetary_score", m_scores),
        Series::new("rfm_segment", segments),
    ])?;
    Ok(scored)
}

fn missing_value(row: usize) -> PipelineError {
    PipelineError::Aggregation {
        table: OUTPUT_NAME.to_string(),
        message: format!("unexpected null in per-user aggregate at row {row}"),
    }
}
