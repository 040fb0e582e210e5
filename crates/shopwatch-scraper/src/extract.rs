//! The extractor seam.
//!
//! An extractor binds a shop landing URL to one hook per field family.
//! Hooks are pure parsers over an already-fetched document: they mutate
//! the entity when they find something newer and report whether anything
//! user-visible changed. A hook that cannot locate its fragment returns an
//! [`ExtractError`]; the driver aggregates those into its fail count.

use scraper::{ElementRef, Html, Selector};
use shopwatch_core::{Product, Shop};

use crate::error::ExtractError;

pub type Changed = bool;

pub trait Extractor: Send + Sync {
    /// The shop landing URL this extractor is keyed by in the registry.
    fn url(&self) -> &str;

    /// Sets the shop name from the shop-level document. Never overwrites a
    /// name that is already known.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the document has no usable title.
    fn set_shop_name(&self, doc: &Html, shop: &mut Shop) -> Result<Changed, ExtractError> {
        set_shop_name_from_title(doc, shop)
    }

    /// # Errors
    ///
    /// Returns [`ExtractError`] when the name cannot be located.
    fn set_product_name(&self, doc: &Html, product: &mut Product) -> Result<Changed, ExtractError>;

    /// # Errors
    ///
    /// Returns [`ExtractError`] when the size data cannot be located.
    fn set_product_sizes(&self, doc: &Html, product: &mut Product)
        -> Result<Changed, ExtractError>;

    /// # Errors
    ///
    /// Returns [`ExtractError`] when price or currency cannot be located.
    fn set_product_price(&self, doc: &Html, product: &mut Product)
        -> Result<Changed, ExtractError>;

    /// # Errors
    ///
    /// Returns [`ExtractError`] when the thumbnail URL cannot be located.
    fn set_product_thumb_url(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError>;

    /// Release dates are rare; the default reports no change.
    ///
    /// # Errors
    ///
    /// Site implementations may fail like any other hook.
    fn set_product_release_time(
        &self,
        _doc: &Html,
        _product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        Ok(false)
    }
}

/// Default shop-name hook: the page `<title>`, taken only while the shop
/// name is still empty.
///
/// # Errors
///
/// Returns [`ExtractError::Missing`] when the document has no title.
pub fn set_shop_name_from_title(doc: &Html, shop: &mut Shop) -> Result<Changed, ExtractError> {
    if !shop.name.is_empty() {
        tracing::debug!(name = %shop.name, url = %shop.url, "shop name exists, won't overwrite");
        return Ok(false);
    }

    let title = doc
        .select(&selector("title"))
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .ok_or(ExtractError::Missing("page title"))?;

    tracing::debug!(name = %title, url = %shop.url, "found shop name");
    shop.name = title;
    Ok(true)
}

/// Parses a compile-time CSS selector literal.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Concatenated, trimmed text content of an element.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Applies a freshly scraped name; the product changes when it differs.
pub(crate) fn update_name(product: &mut Product, name: &str) -> Changed {
    if product.name == name {
        return false;
    }
    product.name = name.to_owned();
    true
}

/// Applies freshly scraped price and currency; the product changes when
/// the price differs.
pub(crate) fn update_price(product: &mut Product, price: f64, currency: &str) -> Changed {
    if product.base_price == Some(price) {
        return false;
    }
    product.base_price = Some(price);
    product.currency = Some(currency.to_owned());
    true
}

/// Applies a freshly scraped thumbnail URL; the product changes when it
/// differs.
pub(crate) fn update_thumb(product: &mut Product, url: String) -> Changed {
    if product.url_thumb.as_deref() == Some(url.as_str()) {
        return false;
    }
    product.url_thumb = Some(url);
    true
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
