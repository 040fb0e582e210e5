//! Shop value object and URL-authority helpers.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::product::Product;

/// A scrapable shop: one landing page plus the products watched under it.
///
/// Documents round-trip through the shops store with these exact field
/// names; optional history (scan stamp, products) defaults on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub uid: Uuid,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub last_scan_stamp: f64,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Shop {
    /// Creates a shop with a fresh v4 UID and an empty name.
    ///
    /// The name stays empty until the first successful shop-page scrape
    /// fills it in.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: String::new(),
            url: url.into(),
            last_scan_stamp: 0.0,
            products: Vec::new(),
        }
    }

    /// Appends a product, keeping product URLs unique within the shop.
    ///
    /// Adding a product whose URL is already registered is a silent no-op.
    pub fn add_product(&mut self, product: Product) {
        if self.products.iter().any(|p| p.url == product.url) {
            tracing::debug!(shop = %self.name, url = %product.url, "product already registered, not added");
            return;
        }
        tracing::debug!(shop = %self.name, url = %product.url, "product added to shop");
        self.products.push(product);
    }

    /// Drops the product with the given URL, if present.
    pub fn remove_product(&mut self, url: &str) {
        self.products.retain(|p| p.url != url);
    }

    /// The authority component of the shop URL (`host[:port]`).
    #[must_use]
    pub fn netloc(&self) -> Option<String> {
        netloc_of(&self.url)
    }

    pub fn set_last_scan_now(&mut self) {
        self.last_scan_stamp = crate::utc_now_stamp();
    }
}

/// Extracts the authority component (`host[:port]`) of a URL.
///
/// Returns `None` for unparseable URLs or URLs without a host, e.g. bare
/// paths or `mailto:` style schemes.
#[must_use]
pub fn netloc_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_owned();
    match parsed.port() {
        Some(port) => Some(format!("{host}:{port}")),
        None => Some(host),
    }
}

/// Builds the canonical shop landing URL (`scheme://netloc`) for a product URL.
#[must_use]
pub fn shop_url_of(product_url: &str) -> Option<String> {
    let parsed = Url::parse(product_url).ok()?;
    let netloc = netloc_of(product_url)?;
    Some(format!("{}://{netloc}", parsed.scheme()))
}

#[cfg(test)]
#[path = "shop_test.rs"]
mod tests;
