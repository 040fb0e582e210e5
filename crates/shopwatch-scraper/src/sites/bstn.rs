//! Extractor for BSTN product pages.
//!
//! Sizes come from a dropdown: options without a `class` attribute are
//! placeholder rows, an empty `class` marks an orderable size, anything
//! else is sold out. Price and currency sit in `itemprop` metas.

use scraper::Html;
use shopwatch_core::Product;

use crate::error::ExtractError;
use crate::extract::{selector, text_of, update_name, update_price, update_thumb, Changed, Extractor};
use crate::sizes::apply_size_observation;

pub const URL: &str = "https://www.bstn.com";

pub struct BstnExtractor;

impl Extractor for BstnExtractor {
    fn url(&self) -> &str {
        URL
    }

    fn set_product_name(&self, doc: &Html, product: &mut Product) -> Result<Changed, ExtractError> {
        extract_name(doc, product, "#detailRight span.productname")
    }

    fn set_product_sizes(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        extract_option_sizes(doc, product, "div.edd-dropdown.clear option")
    }

    fn set_product_price(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        extract_meta_price(doc, product, r#"meta[itemprop="pricecurrency"]"#)
    }

    fn set_product_thumb_url(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        let thumb = doc
            .select(&selector("li.thumbnail-1 div.wrap img"))
            .next()
            .and_then(|img| img.value().attr("src"))
            .filter(|url| !url.is_empty())
            .ok_or(ExtractError::Missing("product image url"))?;

        tracing::debug!(url = %product.url, "found product image url");
        Ok(update_thumb(product, thumb.to_owned()))
    }
}

/// Name extraction shared with sneak-a-venue: both shops run the same
/// storefront markup.
pub(super) fn extract_name(
    doc: &Html,
    product: &mut Product,
    css: &str,
) -> Result<Changed, ExtractError> {
    let name = doc
        .select(&selector(css))
        .next()
        .map(text_of)
        .filter(|n| !n.is_empty())
        .ok_or(ExtractError::Missing("product name element"))?;

    tracing::debug!(name = %name, url = %product.url, "found product name");
    Ok(update_name(product, &name))
}

/// Dropdown-option size extraction shared with sneak-a-venue.
pub(super) fn extract_option_sizes(
    doc: &Html,
    product: &mut Product,
    css: &str,
) -> Result<Changed, ExtractError> {
    let mut observed: Vec<(String, bool)> = Vec::new();
    for option in doc.select(&selector(css)) {
        // Placeholder rows ("choose your size") carry no class attribute.
        let Some(class) = option.value().attr("class") else {
            continue;
        };
        let label = text_of(option);
        let size = label.trim_matches(|c| c == '(' || c == ')').trim();
        if size.is_empty() {
            continue;
        }
        observed.push((size.to_owned(), class.trim().is_empty()));
    }

    if observed.is_empty() {
        return Err(ExtractError::Missing("size options"));
    }
    observed.sort();

    let mut changed = false;
    for (size_str, in_stock) in &observed {
        changed |= apply_size_observation(product, size_str, *in_stock);
    }
    Ok(changed)
}

/// `itemprop` meta price extraction shared with sneak-a-venue; the two
/// storefronts disagree on the casing of the currency itemprop.
pub(super) fn extract_meta_price(
    doc: &Html,
    product: &mut Product,
    currency_css: &str,
) -> Result<Changed, ExtractError> {
    let price_box = doc
        .select(&selector("div.buybox div.price"))
        .next()
        .ok_or(ExtractError::Missing("price box"))?;

    let raw_price = price_box
        .select(&selector(r#"meta[itemprop="price"]"#))
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .ok_or(ExtractError::Missing("price meta"))?;
    let currency = price_box
        .select(&selector(currency_css))
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .ok_or(ExtractError::Missing("currency meta"))?;

    let price: f64 = raw_price
        .replace(',', ".")
        .parse()
        .map_err(|_| ExtractError::Malformed {
            what: "price",
            detail: raw_price.to_owned(),
        })?;

    tracing::debug!(price, currency, url = %product.url, "extracted product price and currency");
    Ok(update_price(product, price, currency))
}
