pub mod attribution;
pub mod config;
pub mod coupon;
pub mod daily;
pub mod engagement;
pub mod error;
pub mod frames;
pub mod funnel;
pub mod lifetime;
pub mod load;
pub mod pipeline;
pub mod product;
pub mod sample;
pub mod schema;

#[cfg(test)]
pub mod testutil;
