//! Day × product sales performance and cart-to-purchase conversion.

use crate::error::Result;
use crate::frames::{event_date, pct_or_null};
use crate::load::RawTables;
use polars::prelude::*;

pub const OUTPUT_NAME: &str = "product_performance_daily";

pub const OUTPUT_COLUMNS: &[&str] = &[
    "date",
    "product_name",
    "times_purchased",
    "total_quantity_sold",
    "total_revenue",
    "times_added_to_cart",
    "cart_to_purchase_rate",
];

/// One row per (date, product) that was purchased. Line items carry no
/// timestamp of their own; the purchase date comes from an explicit
/// many-to-one join to the order header. Line items whose order_id has no
/// order row are orphans and drop out of the join.
///
/// cart_to_purchase_rate is null (not 0) when the product was never added
/// to cart that day: "no denominator" and "0% of cart adds purchased" are
/// different facts.
pub fn product_performance_daily(raw: &RawTables) -> Result<DataFrame> {
    let purchases = raw
        .order_items
        .clone()
        .lazy()
        .join(
            raw.orders
                .clone()
                .lazy()
                .select([col("order_id"), col("time")]),
            [col("order_id")],
            [col("order_id")],
            JoinArgs::new(JoinType::Inner),
        )
        .with_columns([event_date("time")])
        .group_by([col("date"), col("product_name")])
        .agg([
            col("order_id").n_unique().alias("times_purchased"),
            col("product_qty").sum().alias("total_quantity_sold"),
            (col("product_price") * col("product_qty"))
                .sum()
                .round(2)
                .alias("total_revenue"),
        ]);

    let cart_adds = raw
        .add_to_cart
        .clone()
        .lazy()
        .with_columns([event_date("time")])
        .group_by([col("date"), col("product_name")])
        .agg([len().alias("times_added_to_cart")]);

    let rate = pct_or_null(col("times_purchased"), col("times_added_to_cart"));
    let rate = when(rate.clone().gt(lit(100.0)))
        .then(lit(100.0))
        .otherwise(rate)
        .alias("cart_to_purchase_rate");

    let result = purchases
        .join(
            cart_adds,
            [col("date"), col("product_name")],
            [col("date"), col("product_name")],
            JoinArgs::new(JoinType::Left),
        )
        .with_columns([
            col("times_purchased").cast(DataType::Int64),
            col("total_quantity_sold").cast(DataType::Int64),
            col("times_added_to_cart")
                .fill_null(lit(0))
                .cast(DataType::Int64),
        ])
        .with_columns([rate])
        .select(OUTPUT_COLUMNS.iter().map(|c| col(c)).collect::<Vec<_>>())
        .sort_by_exprs(
            vec![col("date"), col("total_revenue")],
            SortMultipleOptions::default().with_order_descendings([false, true]),
        )
        .collect()?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{f64_at, raw_fixture, str_at};

    #[test]
    fn purchases_and_cart_adds_land_on_the_same_grain() {
        let out = product_performance_daily(&raw_fixture()).unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(out.get_column_names(), OUTPUT_COLUMNS);

        // Day 1 sorted by revenue: Blue Sneakers (99.99) before Red T-Shirt.
        assert_eq!(str_at(&out, "product_name", 0), Some("Blue Sneakers"));
        assert_eq!(f64_at(&out, "total_revenue", 0), Some(99.99));
        let qty = out.column("total_quantity_sold").unwrap().i64().unwrap();
        assert_eq!(qty.get(0), Some(1));
        assert_eq!(f64_at(&out, "cart_to_purchase_rate", 0), Some(100.0));

        assert_eq!(str_at(&out, "product_name", 1), Some("Red T-Shirt"));
        assert_eq!(f64_at(&out, "total_revenue", 1), Some(49.98));
        assert_eq!(qty.get(1), Some(2));
    }

    #[test]
    fn rate_is_null_without_cart_adds() {
        let out = product_performance_daily(&raw_fixture()).unwrap();
        // Black Jeans (day 2) was bought straight away, never carted.
        assert_eq!(str_at(&out, "product_name", 2), Some("Black Jeans"));
        let added = out.column("times_added_to_cart").unwrap().i64().unwrap();
        assert_eq!(added.get(2), Some(0));
        assert_eq!(f64_at(&out, "cart_to_purchase_rate", 2), None);
    }

    #[test]
    fn split_line_items_do_not_double_count_orders() {
        let mut raw = raw_fixture();
        // o1 split across two line items of the same product.
        let extra = df!(
            "order_id" => &["o1"],
            "product_name" => &["Blue Sneakers"],
            "product_price" => &[99.99f64],
            "product_qty" => &[1i64],
        )
        .unwrap();
        raw.order_items = raw.order_items.vstack(&extra).unwrap();

        let out = product_performance_daily(&raw).unwrap();
        let purchased = out.column("times_purchased").unwrap().i64().unwrap();
        assert_eq!(str_at(&out, "product_name", 0), Some("Blue Sneakers"));
        // Distinct orders, not line-item rows.
        assert_eq!(purchased.get(0), Some(1));
        let qty = out.column("total_quantity_sold").unwrap().i64().unwrap();
        assert_eq!(qty.get(0), Some(2));
        assert_eq!(f64_at(&out, "total_revenue", 0), Some(199.98));
    }

    #[test]
    fn orphan_line_items_are_dropped() {
        let mut raw = raw_fixture();
        let orphan = df!(
            "order_id" => &["o404"],
            "product_name" => &["Ghost Product"],
            "product_price" => &[1.0f64],
            "product_qty" => &[1i64],
        )
        .unwrap();
        raw.order_items = raw.order_items.vstack(&orphan).unwrap();

        let out = product_performance_daily(&raw).unwrap();
        let names = out.column("product_name").unwrap().str().unwrap();
        assert!(!names.into_iter().flatten().any(|n| n == "Ghost Product"));
    }
}
