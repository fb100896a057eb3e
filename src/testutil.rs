//! Shared fixture data for the aggregator unit tests.

use crate::config::DEFAULT_TIMESTAMP_FORMAT;
use crate::load::RawTables;
use crate::schema::{self, TableDescriptor};
use polars::prelude::*;

fn with_timestamps(df: DataFrame, desc: &TableDescriptor) -> DataFrame {
    schema::parse_timestamps(df, desc, DEFAULT_TIMESTAMP_FORMAT).unwrap()
}

/// A small but complete set of raw tables covering the interesting cases:
/// a session that converts with a coupon, one that converts without, an
/// order with no preceding cart add, a session that never converts, and a
/// user (u3) with zero orders.
pub fn raw_fixture() -> RawTables {
    let users = df!(
        "user_id" => &["u1", "u2", "u3"],
        "has_purchase_last_year" => &[0i64, 1, 0],
        "has_purchase_last_qtr" => &[0i64, 1, 0],
    )
    .unwrap();

    let sessions = with_timestamps(
        df!(
            "session_id" => &["s1", "s2", "s3", "s4"],
            "user_id" => &["u1", "u2", "u2", "u3"],
            "time" => &[
                "2026-02-01 09:00:00",
                "2026-02-01 10:00:00",
                "2026-02-02 11:00:00",
                "2026-02-02 12:00:00",
            ],
            "platform" => &["web", "web", "ios", "web"],
            "device_type" => &["mobile", "desktop", "mobile", "desktop"],
            "country" => &["US", "DE", "DE", "US"],
            "utm_source" => &[Some("google"), None, Some("email"), None],
            "utm_medium" => &[Some("cpc"), None, Some("email"), None],
            "utm_campaign" => &[Some("summer_sale"), None, Some("newsletter"), None],
            "landing_page" => &["/", "/product/red-tshirt", "/", "/about"],
        )
        .unwrap(),
        &schema::SESSIONS,
    );

    let orders = with_timestamps(
        df!(
            "order_id" => &["o1", "o2", "o3"],
            "user_id" => &["u1", "u2", "u2"],
            "session_id" => &["s1", "s2", "s3"],
            "time" => &[
                "2026-02-01 09:20:00",
                "2026-02-01 10:15:00",
                "2026-02-02 11:30:00",
            ],
            "total_price" => &[109.99f64, 49.98, 60.00],
            "shipping_price" => &[5.99f64, 0.0, 0.0],
            "discount" => &[10.0f64, 0.0, 0.0],
            "coupon_code" => &[Some("SAVE10"), Some(""), None],
            "total_items" => &[1i64, 1, 1],
            "total_qty" => &[1i64, 2, 2],
        )
        .unwrap(),
        &schema::ORDERS,
    );

    let order_items = df!(
        "order_id" => &["o1", "o2", "o3"],
        "product_name" => &["Blue Sneakers", "Red T-Shirt", "Black Jeans"],
        "product_price" => &[99.99f64, 24.99, 30.00],
        "product_qty" => &[1i64, 2, 2],
    )
    .unwrap();

    let add_to_cart = with_timestamps(
        df!(
            "session_id" => &["s1", "s2"],
            "user_id" => &["u1", "u2"],
            "time" => &["2026-02-01 09:05:00", "2026-02-01 10:03:00"],
            "product_name" => &["Blue Sneakers", "Red T-Shirt"],
            "product_price" => &[99.99f64, 24.99],
            "product_qty" => &[1i64, 2],
            "path" => &["/product/blue-sneakers", "/product/red-tshirt"],
        )
        .unwrap(),
        &schema::ADD_TO_CART,
    );

    let pageviews = with_timestamps(
        df!(
            "session_id" => &["s1", "s1", "s2", "s3", "s4"],
            "user_id" => &["u1", "u1", "u2", "u2", "u3"],
            "time" => &[
                "2026-02-01 09:00:30",
                "2026-02-01 09:01:00",
                "2026-02-01 10:00:30",
                "2026-02-02 11:00:30",
                "2026-02-02 12:00:30",
            ],
            "path" => &["/", "/product/blue-sneakers", "/product/red-tshirt", "/", "/about"],
        )
        .unwrap(),
        &schema::PAGEVIEWS,
    );

    let scrolls = with_timestamps(
        df!(
            "session_id" => &["s1", "s1", "s2"],
            "time" => &[
                "2026-02-01 09:00:40",
                "2026-02-01 09:00:50",
                "2026-02-01 10:01:00",
            ],
            "scroll_percent" => &[25i64, 75, 100],
            "path" => &["/", "/", "/product/red-tshirt"],
        )
        .unwrap(),
        &schema::SCROLLS,
    );

    let clicks = with_timestamps(
        df!(
            "session_id" => &["s1", "s2"],
            "time" => &["2026-02-01 09:02:00", "2026-02-01 10:02:00"],
            "path" => &["/", "/product/red-tshirt"],
            "target_id" => &["btn-primary", "btn-primary"],
            "target_text" => &["Add to Cart", "Add to Cart"],
        )
        .unwrap(),
        &schema::CLICKS,
    );

    RawTables {
        users,
        sessions,
        orders,
        order_items,
        add_to_cart,
        pageviews,
        scrolls,
        clicks,
    }
}

/// Same tables with every event-carrying frame emptied, keeping schemas.
pub fn empty_fixture() -> RawTables {
    let full = raw_fixture();
    let clear = |df: &DataFrame| df.clear();
    RawTables {
        users: clear(&full.users),
        sessions: clear(&full.sessions),
        orders: clear(&full.orders),
        order_items: clear(&full.order_items),
        add_to_cart: clear(&full.add_to_cart),
        pageviews: clear(&full.pageviews),
        scrolls: clear(&full.scrolls),
        clicks: clear(&full.clicks),
    }
}

/// Value of a float column at `row`, rounded lookup for assertions.
pub fn f64_at(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
    df.column(column).unwrap().f64().unwrap().get(row)
}

pub fn str_at<'a>(df: &'a DataFrame, column: &str, row: usize) -> Option<&'a str> {
    df.column(column).unwrap().str().unwrap().get(row)
}
