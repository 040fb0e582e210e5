//! Extractor for Footdistrict product pages.
//!
//! The interesting data hides in inline scripts: sizes in the
//! `Product.Config` JSON, price and currency in an `fbq` tracking call,
//! and an occasional `countDownDate` for upcoming releases.

use regex::Regex;
use scraper::Html;
use shopwatch_core::Product;

use crate::error::ExtractError;
use crate::extract::{selector, text_of, update_name, update_price, update_thumb, Changed, Extractor};
use crate::sizes::apply_size_observation;

pub const URL: &str = "https://footdistrict.com";

pub struct FootdistrictExtractor;

impl Extractor for FootdistrictExtractor {
    fn url(&self) -> &str {
        URL
    }

    fn set_product_name(&self, doc: &Html, product: &mut Product) -> Result<Changed, ExtractError> {
        let name = doc
            .select(&selector("div.product-shop div.product-name"))
            .next()
            .map(text_of)
            .filter(|n| !n.is_empty())
            .ok_or(ExtractError::Missing("product name element"))?;

        tracing::debug!(name = %name, url = %product.url, "found product name");
        Ok(update_name(product, &name))
    }

    fn set_product_sizes(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        let js = script_containing(doc, "new Product.Config")
            .ok_or(ExtractError::Missing("sizes script"))?;

        // The config JSON is the braced blob inside the JS statement.
        let json_re = Regex::new(r"(?s)\{.*\}").expect("valid regex");
        let json_str = json_re
            .find(&js)
            .ok_or(ExtractError::Missing("config JSON in sizes script"))?
            .as_str();
        let data: serde_json::Value =
            serde_json::from_str(json_str).map_err(|e| ExtractError::Malformed {
                what: "sizes config JSON",
                detail: e.to_string(),
            })?;

        // The size attribute set has a fixed id in this storefront.
        let options = data
            .pointer("/attributes/134/options")
            .and_then(|v| v.as_array())
            .ok_or(ExtractError::Missing("size options in config JSON"))?;

        let size_re = Regex::new(r"[-+]?\d*\.\d+|\d+").expect("valid regex");
        let mut changed = false;
        let mut extracted = 0usize;
        for item in options {
            let Some(label) = item.get("label").and_then(|v| v.as_str()) else {
                continue;
            };
            // Labels look like "37 * Not available" or "39.5".
            let Some(size) = size_re.find(label) else {
                continue;
            };
            let in_stock = !label.contains("Not available");
            changed |= apply_size_observation(product, size.as_str(), in_stock);
            extracted += 1;
        }

        if extracted == 0 {
            return Err(ExtractError::Missing("sizes in config JSON"));
        }
        tracing::debug!(count = extracted, url = %product.url, "processed sizes from config JSON");
        Ok(changed)
    }

    fn set_product_price(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        let js = script_containing(doc, "fbq('track', 'AddToCart'")
            .ok_or(ExtractError::Missing("price script"))?;

        let value_re = Regex::new(r"value:\s+(.*?)[,\n]").expect("valid regex");
        let currency_re = Regex::new(r"currency:\s+(.*?)[,\n]").expect("valid regex");

        let raw_price = value_re
            .captures(&js)
            .map(|caps| caps[1].trim_matches('\'').to_owned())
            .ok_or(ExtractError::Missing("price value in price script"))?;
        let currency = currency_re
            .captures(&js)
            .map(|caps| caps[1].trim_matches('\'').to_owned())
            .ok_or(ExtractError::Missing("currency in price script"))?;

        let price: f64 = raw_price.parse().map_err(|_| ExtractError::Malformed {
            what: "price",
            detail: raw_price.clone(),
        })?;

        tracing::debug!(price, currency = %currency, url = %product.url, "extracted product price and currency");
        Ok(update_price(product, price, &currency))
    }

    fn set_product_thumb_url(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        let thumb = doc
            .select(&selector("div.product-img-box div.more-views.mobilehidden a"))
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|url| !url.is_empty())
            .ok_or(ExtractError::Missing("product image url"))?;

        tracing::debug!(url = %product.url, "found product image url");
        Ok(update_thumb(product, thumb.to_owned()))
    }

    /// Release-date scaffolding: the countdown is detected and logged, but
    /// nothing is written yet, so this hook never reports a change.
    fn set_product_release_time(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        let Some(js) = script_containing(doc, "var countDownDate") else {
            // Release dates are rare; absence is the normal case.
            tracing::debug!(url = %product.url, "no countdown script found for release date");
            return Ok(false);
        };

        let stamp_re = Regex::new(
            r"[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[1-2][0-9]|3[0-1]) (2[0-3]|[01][0-9]):[0-5][0-9]:[0-5][0-9]",
        )
        .expect("valid regex");
        if let Some(stamp) = stamp_re.find(&js) {
            tracing::debug!(stamp = stamp.as_str(), url = %product.url, "found release countdown");
        }
        Ok(false)
    }
}

fn script_containing(doc: &Html, needle: &str) -> Option<String> {
    doc.select(&selector(r#"script[type="text/javascript"]"#))
        .map(|script| script.text().collect::<String>())
        .find(|js| js.contains(needle))
}
