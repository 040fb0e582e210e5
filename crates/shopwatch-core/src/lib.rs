pub mod product;
pub mod shop;

pub use product::{Product, Size};
pub use shop::{netloc_of, shop_url_of, Shop};

/// Current UTC time as a UNIX epoch stamp with sub-second precision.
///
/// All scan and release stamps in the entity model use this format.
#[must_use]
pub fn utc_now_stamp() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}
