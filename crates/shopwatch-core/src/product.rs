//! Product and size value objects.
//!
//! All date/time fields are stored as UTC UNIX epoch stamps (`f64`); any
//! display-timezone conversion is the caller's responsibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A watched product page with the attributes extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub uid: Uuid,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub base_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub url_thumb: Option<String>,
    #[serde(default)]
    pub release_date_stamp: Option<f64>,
    #[serde(default)]
    pub last_scan_stamp: f64,
    #[serde(default)]
    pub sizes: Vec<Size>,
}

impl Product {
    /// Creates an empty product for a URL, with a fresh v4 UID.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: String::new(),
            url: url.into(),
            base_price: None,
            currency: None,
            url_thumb: None,
            release_date_stamp: None,
            last_scan_stamp: 0.0,
            sizes: Vec::new(),
        }
    }

    /// Finds a size by its exact `sizeEU` string.
    #[must_use]
    pub fn find_size(&self, size_str: &str) -> Option<&Size> {
        self.sizes
            .iter()
            .find(|s| s.size_eu.as_deref() == Some(size_str))
    }

    /// Mutable variant of [`Product::find_size`].
    pub fn find_size_mut(&mut self, size_str: &str) -> Option<&mut Size> {
        self.sizes
            .iter_mut()
            .find(|s| s.size_eu.as_deref() == Some(size_str))
    }

    /// Appends a size, keeping `sizeEU` unique within the product.
    ///
    /// Adding a size whose `sizeEU` is already present is a silent no-op.
    pub fn add_size(&mut self, size: Size) {
        if let Some(existing) = &size.size_eu {
            if self.find_size(existing).is_some() {
                tracing::debug!(size = %existing, url = %self.url, "size already registered, not added");
                return;
            }
        }
        tracing::debug!(size = ?size.size_eu, url = %self.url, "size added");
        self.sizes.push(size);
    }

    /// Formats the base price with its currency, e.g. `"98.55 EUR"`.
    ///
    /// Falls back to `"… [UNKNOWN CURRENCY]"` when only the price is known
    /// and `"unknown"` when there is no price at all.
    #[must_use]
    pub fn price_with_currency(&self) -> String {
        match (self.base_price, self.currency.as_deref()) {
            (Some(price), Some(currency)) => format!("{price:.2} {currency}"),
            (Some(price), None) => format!("{price:.2} [UNKNOWN CURRENCY]"),
            (None, _) => "unknown".to_owned(),
        }
    }

    /// The release date as a UTC datetime, when one is known.
    #[must_use]
    pub fn release_date(&self) -> Option<DateTime<Utc>> {
        let stamp = self.release_date_stamp?;
        DateTime::from_timestamp(stamp as i64, 0)
    }

    /// Stores a release datetime as a UTC epoch stamp.
    pub fn set_release_date(&mut self, datetime: DateTime<Utc>) {
        self.release_date_stamp = Some(datetime.timestamp() as f64);
    }

    pub fn invalidate_release_date(&mut self) {
        self.release_date_stamp = None;
    }

    pub fn set_last_scan_now(&mut self) {
        self.last_scan_stamp = crate::utc_now_stamp();
    }
}

/// One size variant of a product.
///
/// `size_eu` is free-form ("40", "40 1/3", "44.5"); `is_in_stock` is
/// tri-valued; `None` means the stock state has never been observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    #[serde(default = "Uuid::new_v4")]
    pub uid: Uuid,
    #[serde(default, rename = "sizeEU")]
    pub size_eu: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_add_to_cart: Option<String>,
    #[serde(default)]
    pub is_in_stock: Option<bool>,
}

impl Size {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uid: Uuid::new_v4(),
            ..Self::default()
        }
    }

    /// Creates a size with the given `sizeEU` and observed stock state.
    #[must_use]
    pub fn observed(size_eu: impl Into<String>, in_stock: bool) -> Self {
        Self {
            uid: Uuid::new_v4(),
            size_eu: Some(size_eu.into()),
            is_in_stock: Some(in_stock),
            ..Self::default()
        }
    }

    /// Human-readable stock state for the tri-valued flag.
    #[must_use]
    pub fn stock_readable(&self) -> &'static str {
        match self.is_in_stock {
            Some(true) => "In stock",
            Some(false) => "Out of stock",
            None => "Unknown",
        }
    }
}

#[cfg(test)]
#[path = "product_test.rs"]
mod tests;
