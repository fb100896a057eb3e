//! Seeded synthetic raw-data generator.
//!
//! Emits the eight raw CSV tables with referential consistency between
//! user_id / session_id / order_id, plus the edge cases the pipeline has
//! to survive: sessions that never convert, orders without a coupon code,
//! orders without a preceding cart add, and one user with zero orders.

use crate::config::DEFAULT_TIMESTAMP_FORMAT;
use crate::error::Result;
use crate::schema;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::info;

const PLATFORMS: &[&str] = &["web", "ios", "android"];
const DEVICES: &[&str] = &["mobile", "desktop", "tablet"];
const COUNTRIES: &[&str] = &["US", "DE", "GB", "FR", "IN", "BR"];
const UTM_SOURCES: &[&str] = &["google", "facebook", "instagram", "email", "direct", "twitter"];
const UTM_MEDIUMS: &[&str] = &["cpc", "social", "email", "organic", "referral"];
const CAMPAIGNS: &[&str] = &["summer_sale", "black_friday", "new_year", "spring_promo"];

const PRODUCTS: &[(&str, f64)] = &[
    ("Blue Sneakers", 99.99),
    ("Red T-Shirt", 24.99),
    ("Black Jeans", 59.99),
    ("White Hoodie", 49.99),
    ("Gray Sweatpants", 39.99),
    ("Running Shoes", 119.99),
    ("Denim Jacket", 79.99),
    ("Cotton Socks", 9.99),
    ("Leather Belt", 34.99),
    ("Baseball Cap", 19.99),
    ("Winter Coat", 149.99),
    ("Yoga Pants", 44.99),
];

const CONTENT_PAGES: &[&str] = &[
    "/",
    "/category/clothing",
    "/category/shoes",
    "/category/accessories",
    "/cart",
    "/checkout",
    "/about",
    "/contact",
];

/// (code, discount fraction of the order subtotal)
const COUPONS: &[(&str, f64)] = &[
    ("SAVE10", 0.10),
    ("SAVE20", 0.20),
    ("WELCOME15", 0.15),
    ("SUMMER25", 0.25),
];

const CLICK_TARGETS: &[(&str, &str)] = &[
    ("btn-primary", "Add to Cart"),
    ("nav-link", "View Details"),
    ("product-card", "Shop Now"),
];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub seed: u64,
    pub num_users: usize,
    pub num_sessions: usize,
    pub days: i64,
    /// Last calendar date events are generated for.
    pub end_date: NaiveDate,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_users: 200,
            num_sessions: 1_000,
            days: 30,
            end_date: chrono::Local::now().date_naive(),
        }
    }
}

/// The eight generated tables in raw CSV form (timestamps as strings).
#[derive(Debug)]
pub struct SampleData {
    pub users: DataFrame,
    pub sessions: DataFrame,
    pub orders: DataFrame,
    pub order_items: DataFrame,
    pub add_to_cart: DataFrame,
    pub pageviews: DataFrame,
    pub scrolls: DataFrame,
    pub clicks: DataFrame,
}

impl SampleData {
    pub fn write(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let tables = [
            (schema::USERS.file_name, &self.users),
            (schema::SESSIONS.file_name, &self.sessions),
            (schema::ORDERS.file_name, &self.orders),
            (schema::ORDER_ITEMS.file_name, &self.order_items),
            (schema::ADD_TO_CART.file_name, &self.add_to_cart),
            (schema::PAGEVIEWS.file_name, &self.pageviews),
            (schema::SCROLLS.file_name, &self.scrolls),
            (schema::CLICKS.file_name, &self.clicks),
        ];
        for (file_name, df) in tables {
            let path = dir.join(file_name);
            let mut file = std::fs::File::create(&path)?;
            let mut df = df.clone();
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)?;
            info!("wrote {} ({} rows)", path.display(), df.height());
        }
        Ok(())
    }
}

struct SessionSeed {
    session_id: String,
    user_id: String,
    time: NaiveDateTime,
}

fn fmt(ts: NaiveDateTime) -> String {
    ts.format(DEFAULT_TIMESTAMP_FORMAT).to_string()
}

/// Generate a full, referentially consistent dataset from a fixed seed.
/// The same config always produces the same bytes.
pub fn generate(config: &SampleConfig) -> Result<SampleData> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let start_date = config.end_date - Duration::days(config.days.max(1) - 1);

    // Users. user_0001 is deliberately never assigned a session, so the
    // dataset always contains a user with zero orders.
    let user_ids: Vec<String> = (1..=config.num_users.max(2))
        .map(|i| format!("user_{i:04}"))
        .collect();
    let has_year: Vec<i64> = user_ids
        .iter()
        .map(|_| i64::from(rng.gen_bool(0.33)))
        .collect();
    let has_qtr: Vec<i64> = has_year
        .iter()
        .map(|&y| if y == 1 { i64::from(rng.gen_bool(0.5)) } else { 0 })
        .collect();
    let users = df!(
        "user_id" => &user_ids,
        "has_purchase_last_year" => &has_year,
        "has_purchase_last_qtr" => &has_qtr,
    )?;

    // Sessions.
    let mut seeds: Vec<SessionSeed> = Vec::with_capacity(config.num_sessions);
    let mut s_session_id = Vec::new();
    let mut s_user_id = Vec::new();
    let mut s_time = Vec::new();
    let mut s_platform = Vec::new();
    let mut s_device = Vec::new();
    let mut s_country = Vec::new();
    let mut s_utm_source: Vec<String> = Vec::new();
    let mut s_utm_medium: Vec<String> = Vec::new();
    let mut s_utm_campaign: Vec<String> = Vec::new();
    let mut s_landing = Vec::new();

    for i in 1..=config.num_sessions {
        let session_id = format!("sess_{i:05}");
        // Skip index 0 so user_0001 stays order-free.
        let user_idx = rng.gen_range(1..user_ids.len());
        let day = rng.gen_range(0..config.days.max(1));
        // Hours cap at 22 so every follow-on event (pageviews, cart adds,
        // orders minutes later) stays on the session's calendar date.
        let time = start_date
            .and_hms_opt(
                rng.gen_range(0..23) as u32,
                rng.gen_range(0..60) as u32,
                rng.gen_range(0..60) as u32,
            )
            .unwrap_or_else(|| start_date.and_hms_opt(12, 0, 0).expect("valid time"))
            + Duration::days(day);

        let source = *UTM_SOURCES.choose(&mut rng).expect("non-empty");
        let (utm_source, utm_medium, utm_campaign) = if source == "direct" {
            (String::new(), String::new(), String::new())
        } else {
            (
                source.to_string(),
                UTM_MEDIUMS.choose(&mut rng).expect("non-empty").to_string(),
                CAMPAIGNS.choose(&mut rng).expect("non-empty").to_string(),
            )
        };

        s_session_id.push(session_id.clone());
        s_user_id.push(user_ids[user_idx].clone());
        s_time.push(fmt(time));
        s_platform.push(*PLATFORMS.choose(&mut rng).expect("non-empty"));
        s_device.push(*DEVICES.choose(&mut rng).expect("non-empty"));
        s_country.push(*COUNTRIES.choose(&mut rng).expect("non-empty"));
        s_utm_source.push(utm_source);
        s_utm_medium.push(utm_medium);
        s_utm_campaign.push(utm_campaign);
        s_landing.push(*CONTENT_PAGES.choose(&mut rng).expect("non-empty"));

        seeds.push(SessionSeed {
            session_id,
            user_id: user_ids[user_idx].clone(),
            time,
        });
    }

    let sessions = df!(
        "session_id" => &s_session_id,
        "user_id" => &s_user_id,
        "time" => &s_time,
        "platform" => &s_platform,
        "device_type" => &s_device,
        "country" => &s_country,
        "utm_source" => &s_utm_source,
        "utm_medium" => &s_utm_medium,
        "utm_campaign" => &s_utm_campaign,
        "landing_page" => &s_landing,
    )?;

    // Pageviews, scrolls, clicks.
    let mut pv_session = Vec::new();
    let mut pv_user = Vec::new();
    let mut pv_time = Vec::new();
    let mut pv_path = Vec::new();
    let mut sc_session = Vec::new();
    let mut sc_time = Vec::new();
    let mut sc_percent = Vec::new();
    let mut sc_path = Vec::new();
    let mut cl_session = Vec::new();
    let mut cl_time = Vec::new();
    let mut cl_path = Vec::new();
    let mut cl_target_id = Vec::new();
    let mut cl_target_text = Vec::new();

    let mut viewed_product: Vec<Option<usize>> = Vec::with_capacity(seeds.len());

    for seed in &seeds {
        let page_count = rng.gen_range(1..=5);
        let mut product_seen: Option<usize> = None;

        for page_num in 0..page_count {
            let at = seed.time + Duration::seconds(30 + page_num * 45);
            let path = if rng.gen_bool(0.4) {
                let idx = rng.gen_range(0..PRODUCTS.len());
                product_seen = Some(idx);
                product_path(idx)
            } else {
                CONTENT_PAGES.choose(&mut rng).expect("non-empty").to_string()
            };

            pv_session.push(seed.session_id.clone());
            pv_user.push(seed.user_id.clone());
            pv_time.push(fmt(at));
            pv_path.push(path.clone());

            if rng.gen_bool(0.6) {
                sc_session.push(seed.session_id.clone());
                sc_time.push(fmt(at + Duration::seconds(10)));
                sc_percent.push(*[25i64, 50, 75, 100].choose(&mut rng).expect("non-empty"));
                sc_path.push(path.clone());
            }
            if rng.gen_bool(0.5) {
                let (target_id, target_text) =
                    *CLICK_TARGETS.choose(&mut rng).expect("non-empty");
                cl_session.push(seed.session_id.clone());
                cl_time.push(fmt(at + Duration::seconds(20)));
                cl_path.push(path);
                cl_target_id.push(target_id);
                cl_target_text.push(target_text);
            }
        }
        viewed_product.push(product_seen);
    }

    let pageviews = df!(
        "session_id" => &pv_session,
        "user_id" => &pv_user,
        "time" => &pv_time,
        "path" => &pv_path,
    )?;
    let scrolls = df!(
        "session_id" => &sc_session,
        "time" => &sc_time,
        "scroll_percent" => &sc_percent,
        "path" => &sc_path,
    )?;
    let clicks = df!(
        "session_id" => &cl_session,
        "time" => &cl_time,
        "path" => &cl_path,
        "target_id" => &cl_target_id,
        "target_text" => &cl_target_text,
    )?;

    // Cart adds: sessions that saw a product page add it to cart half the
    // time.
    let mut ca_session = Vec::new();
    let mut ca_user = Vec::new();
    let mut ca_time = Vec::new();
    let mut ca_product = Vec::new();
    let mut ca_price = Vec::new();
    let mut ca_qty = Vec::new();
    let mut ca_path = Vec::new();
    let mut carted: Vec<Option<usize>> = Vec::with_capacity(seeds.len());

    for (seed, product) in seeds.iter().zip(&viewed_product) {
        let added = match product {
            Some(idx) if rng.gen_bool(0.5) => {
                let (name, price) = PRODUCTS[*idx];
                ca_session.push(seed.session_id.clone());
                ca_user.push(seed.user_id.clone());
                ca_time.push(fmt(seed.time + Duration::minutes(rng.gen_range(3..9))));
                ca_product.push(name);
                ca_price.push(price);
                ca_qty.push(*[1i64, 1, 1, 2].choose(&mut rng).expect("non-empty"));
                ca_path.push(product_path(*idx));
                Some(*idx)
            }
            _ => None,
        };
        carted.push(added);
    }

    let add_to_cart = df!(
        "session_id" => &ca_session,
        "user_id" => &ca_user,
        "time" => &ca_time,
        "product_name" => &ca_product,
        "product_price" => &ca_price,
        "product_qty" => &ca_qty,
        "path" => &ca_path,
    )?;

    // Orders: 60% of carted sessions convert, plus a 3% slice of everyone
    // else (buy-without-cart flows exist and the funnel has to tolerate
    // them). 30% of orders carry a coupon; the rest keep an empty code.
    let mut o_order_id = Vec::new();
    let mut o_user = Vec::new();
    let mut o_session = Vec::new();
    let mut o_time = Vec::new();
    let mut o_total = Vec::new();
    let mut o_shipping = Vec::new();
    let mut o_discount = Vec::new();
    let mut o_coupon: Vec<String> = Vec::new();
    let mut o_items = Vec::new();
    let mut o_qty = Vec::new();
    let mut li_order_id = Vec::new();
    let mut li_product = Vec::new();
    let mut li_price = Vec::new();
    let mut li_qty = Vec::new();

    let mut order_seq = 0usize;
    for (seed, cart_product) in seeds.iter().zip(&carted) {
        let converts = match cart_product {
            Some(_) => rng.gen_bool(0.6),
            None => rng.gen_bool(0.03),
        };
        if !converts {
            continue;
        }
        order_seq += 1;
        let order_id = format!("ORD-{order_seq:06}");
        let order_time = seed.time + Duration::minutes(rng.gen_range(10..31));

        let item_count = rng.gen_range(1..=3);
        let mut subtotal = 0.0;
        let mut total_qty = 0i64;
        for slot in 0..item_count {
            // The carted product is always in the basket.
            let idx = match (slot, cart_product) {
                (0, Some(idx)) => *idx,
                _ => rng.gen_range(0..PRODUCTS.len()),
            };
            let (name, price) = PRODUCTS[idx];
            let qty = *[1i64, 1, 2].choose(&mut rng).expect("non-empty");
            subtotal += price * qty as f64;
            total_qty += qty;
            li_order_id.push(order_id.clone());
            li_product.push(name);
            li_price.push(price);
            li_qty.push(qty);
        }

        let shipping = *[0.0, 5.99, 9.99, 14.99].choose(&mut rng).expect("non-empty");
        let (coupon, discount) = if rng.gen_bool(0.3) {
            let (code, fraction) = *COUPONS.choose(&mut rng).expect("non-empty");
            (code.to_string(), round2(subtotal * fraction))
        } else {
            (String::new(), 0.0)
        };

        o_order_id.push(order_id);
        o_user.push(seed.user_id.clone());
        o_session.push(seed.session_id.clone());
        o_time.push(fmt(order_time));
        o_total.push(round2(subtotal + shipping - discount));
        o_shipping.push(shipping);
        o_discount.push(discount);
        o_coupon.push(coupon);
        o_items.push(item_count);
        o_qty.push(total_qty);
    }

    let orders = df!(
        "order_id" => &o_order_id,
        "user_id" => &o_user,
        "session_id" => &o_session,
        "time" => &o_time,
        "total_price" => &o_total,
        "shipping_price" => &o_shipping,
        "discount" => &o_discount,
        "coupon_code" => &o_coupon,
        "total_items" => &o_items,
        "total_qty" => &o_qty,
    )?;

    let order_items = df!(
        "order_id" => &li_order_id,
        "product_name" => &li_product,
        "product_price" => &li_price,
        "product_qty" => &li_qty,
    )?;

    Ok(SampleData {
        users,
        sessions,
        orders,
        order_items,
        add_to_cart,
        pageviews,
        scrolls,
        clicks,
    })
}

fn product_path(idx: usize) -> String {
    let slug = PRODUCTS[idx].0.to_lowercase().replace(' ', "-");
    format!("/product/{slug}")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
