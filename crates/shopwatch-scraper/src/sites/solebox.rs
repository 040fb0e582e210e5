//! Extractor for solebox product pages.
//!
//! The product name lives in a `data-gtm` JSON blob; sizes are swatch
//! spans, with sold-out and in-store-only variants carrying extra marker
//! classes.

use std::collections::HashSet;

use regex::Regex;
use scraper::Html;
use shopwatch_core::Product;

use crate::error::ExtractError;
use crate::extract::{selector, text_of, update_name, update_price, update_thumb, Changed, Extractor};
use crate::sizes::apply_size_observation;

pub const URL: &str = "https://www.solebox.com";

pub struct SoleboxExtractor;

impl Extractor for SoleboxExtractor {
    fn url(&self) -> &str {
        URL
    }

    fn set_product_name(&self, doc: &Html, product: &mut Product) -> Result<Changed, ExtractError> {
        let details = doc
            .select(&selector("div.js-product-details"))
            .next()
            .ok_or(ExtractError::Missing("product details element"))?;
        let raw = details
            .value()
            .attr("data-gtm")
            .ok_or(ExtractError::Missing("data-gtm attribute"))?;
        let data: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| ExtractError::Malformed {
                what: "product details JSON",
                detail: e.to_string(),
            })?;
        let name = data
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or(ExtractError::Missing("name in product details JSON"))?;

        tracing::debug!(name, url = %product.url, "found product name");
        Ok(update_name(product, name))
    }

    fn set_product_sizes(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        let sold_out: HashSet<String> = doc
            .select(&selector(
                "span.js-size-value.b-swatch-value--in-store-only",
            ))
            .chain(doc.select(&selector("span.js-size-value.b-swatch-value--sold-out")))
            .map(text_of)
            .collect();

        let mut all: Vec<String> = doc
            .select(&selector("span.js-size-value"))
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect();
        all.sort();
        all.dedup();

        let mut changed = false;
        for size_str in &all {
            let in_stock = !sold_out.contains(size_str);
            changed |= apply_size_observation(product, size_str, in_stock);
        }
        Ok(changed)
    }

    fn set_product_price(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        let info = doc
            .select(&selector("div.b-pdp-product-info-section"))
            .next()
            .ok_or(ExtractError::Missing("product info section"))?;
        let price_text = info
            .select(&selector("span.b-product-tile-price-item"))
            .next()
            .map(text_of)
            .ok_or(ExtractError::Missing("price element"))?;

        // Like "98,55 €": number, whitespace, currency glyph.
        let re = Regex::new(r"([0-9.,]+)\s+([^0-9\s]+)").expect("valid regex");
        let caps = re
            .captures(&price_text)
            .ok_or(ExtractError::Missing("price and currency in price text"))?;
        let price: f64 =
            caps[1]
                .replace(',', ".")
                .parse()
                .map_err(|_| ExtractError::Malformed {
                    what: "price",
                    detail: caps[1].to_owned(),
                })?;
        let currency = caps[2].to_owned();

        tracing::debug!(price, currency = %currency, url = %product.url, "extracted product price and currency");
        Ok(update_price(product, price, &currency))
    }

    fn set_product_thumb_url(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        let thumb = doc
            .select(&selector(
                "div.b-pdp-product-preview-wrapper div.b-pdp-carousel-item div[data-default-src]",
            ))
            .next()
            .and_then(|div| div.value().attr("data-default-src"))
            .filter(|url| !url.is_empty())
            .ok_or(ExtractError::Missing("product image url"))?;

        tracing::debug!(url = %product.url, "found product image url");
        Ok(update_thumb(product, thumb.to_owned()))
    }
}
