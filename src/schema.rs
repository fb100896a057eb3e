use crate::error::{PipelineError, Result};
use polars::prelude::*;

/// Static description of one raw input table: the CSV file it lives in,
/// the columns every downstream aggregation depends on, and the columns
/// holding event timestamps.
#[derive(Debug, Clone, Copy)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub file_name: &'static str,
    pub required_columns: &'static [&'static str],
    pub timestamp_columns: &'static [&'static str],
}

pub const USERS: TableDescriptor = TableDescriptor {
    name: "users",
    file_name: "user_table.csv",
    required_columns: &["user_id", "has_purchase_last_year", "has_purchase_last_qtr"],
    timestamp_columns: &[],
};

pub const SESSIONS: TableDescriptor = TableDescriptor {
    name: "sessions",
    file_name: "session_table.csv",
    required_columns: &["session_id", "user_id", "time"],
    timestamp_columns: &["time"],
};

pub const ORDERS: TableDescriptor = TableDescriptor {
    name: "orders",
    file_name: "order_table.csv",
    required_columns: &[
        "order_id",
        "user_id",
        "session_id",
        "time",
        "total_price",
        "discount",
        "coupon_code",
    ],
    timestamp_columns: &["time"],
};

pub const ORDER_ITEMS: TableDescriptor = TableDescriptor {
    name: "order_items",
    file_name: "order_line_item_table.csv",
    required_columns: &["order_id", "product_name", "product_price", "product_qty"],
    timestamp_columns: &[],
};

pub const ADD_TO_CART: TableDescriptor = TableDescriptor {
    name: "add_to_cart",
    file_name: "add_to_cart_table.csv",
    required_columns: &["session_id", "time", "product_name"],
    timestamp_columns: &["time"],
};

pub const PAGEVIEWS: TableDescriptor = TableDescriptor {
    name: "pageviews",
    file_name: "pageview_table.csv",
    required_columns: &["session_id", "user_id", "time", "path"],
    timestamp_columns: &["time"],
};

pub const SCROLLS: TableDescriptor = TableDescriptor {
    name: "scrolls",
    file_name: "scroll_table.csv",
    required_columns: &["session_id", "time", "scroll_percent", "path"],
    timestamp_columns: &["time"],
};

pub const CLICKS: TableDescriptor = TableDescriptor {
    name: "clicks",
    file_name: "click_table.csv",
    required_columns: &["session_id", "time", "path"],
    timestamp_columns: &["time"],
};

pub const ALL_TABLES: &[TableDescriptor] = &[
    USERS, SESSIONS, ORDERS, ORDER_ITEMS, ADD_TO_CART, PAGEVIEWS, SCROLLS, CLICKS,
];

/// Check that every required column is present. Returns the table unchanged
/// on success so validation can be chained into the load path.
pub fn validate_columns(df: DataFrame, desc: &TableDescriptor) -> Result<DataFrame> {
    let present: Vec<&str> = df.get_column_names();
    let missing: Vec<String> = desc
        .required_columns
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::Schema {
            table: desc.name.to_string(),
            missing,
        });
    }
    Ok(df)
}

/// Parse every timestamp column to Datetime with a strict format.
///
/// A value that fails to parse aborts the load instead of becoming null:
/// bad timestamps are a data-quality problem that has to surface, not be
/// silently dropped from every downstream aggregate.
pub fn parse_timestamps(df: DataFrame, desc: &TableDescriptor, format: &str) -> Result<DataFrame> {
    if desc.timestamp_columns.is_empty() {
        return Ok(df);
    }

    let options = StrptimeOptions {
        format: Some(format.to_string()),
        strict: true,
        exact: true,
        cache: true,
    };

    let exprs: Vec<Expr> = desc
        .timestamp_columns
        .iter()
        .map(|name| {
            col(name)
                .str()
                .to_datetime(
                    Some(TimeUnit::Milliseconds),
                    None,
                    options.clone(),
                    lit("raise"),
                )
                .alias(name)
        })
        .collect();

    df.lazy()
        .with_columns(exprs)
        .collect()
        .map_err(|e| PipelineError::Parse {
            table: desc.name.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_are_named_in_the_error() {
        let df = df!("user_id" => &["u1", "u2"]).unwrap();
        let err = validate_columns(df, &USERS).unwrap_err();
        match err {
            PipelineError::Schema { table, missing } => {
                assert_eq!(table, "users");
                assert_eq!(
                    missing,
                    vec!["has_purchase_last_year", "has_purchase_last_qtr"]
                );
            }
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn complete_table_passes_validation() {
        let df = df!(
            "user_id" => &["u1"],
            "has_purchase_last_year" => &[0i32],
            "has_purchase_last_qtr" => &[0i32],
        )
        .unwrap();
        assert!(validate_columns(df, &USERS).is_ok());
    }

    #[test]
    fn timestamps_parse_with_the_default_format() {
        let df = df!(
            "session_id" => &["s1"],
            "user_id" => &["u1"],
            "time" => &["2026-02-01 09:30:00"],
        )
        .unwrap();
        let parsed = parse_timestamps(df, &SESSIONS, crate::config::DEFAULT_TIMESTAMP_FORMAT)
            .unwrap();
        assert!(matches!(
            parsed.column("time").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn unparseable_timestamp_is_a_parse_error() {
        let df = df!(
            "session_id" => &["s1"],
            "user_id" => &["u1"],
            "time" => &["not a timestamp"],
        )
        .unwrap();
        let err = parse_timestamps(df, &SESSIONS, crate::config::DEFAULT_TIMESTAMP_FORMAT)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }
}
