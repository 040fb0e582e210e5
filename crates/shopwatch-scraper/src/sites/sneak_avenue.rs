//! Extractor for Sneak-A-Venue product pages.
//!
//! Same storefront family as BSTN, with its own variant-select block, a
//! camel-cased currency itemprop and relative image URLs.

use scraper::Html;
use shopwatch_core::Product;
use url::Url;

use crate::error::ExtractError;
use crate::extract::{selector, update_thumb, Changed, Extractor};
use crate::sites::bstn::{extract_meta_price, extract_name, extract_option_sizes};

pub const URL: &str = "https://www.sneak-a-venue.de";

pub struct SneakAvenueExtractor;

impl Extractor for SneakAvenueExtractor {
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
        extract_option_sizes(doc, product, "div.selectVariants.clear option")
    }

    fn set_product_price(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        extract_meta_price(doc, product, r#"meta[itemprop="priceCurrency"]"#)
    }

    fn set_product_thumb_url(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<Changed, ExtractError> {
        let thumb = doc
            .select(&selector("div.thumbnail-1 div.wrap img"))
            .next()
            .and_then(|img| img.value().attr("src"))
            .filter(|url| !url.is_empty())
            .ok_or(ExtractError::Missing("product image url"))?;

        // The image URL is relative; anchor it on the shop URL.
        let absolute = Url::parse(URL)
            .and_then(|base| base.join(thumb))
            .map_err(|e| ExtractError::Malformed {
                what: "product image url",
                detail: e.to_string(),
            })?;

        tracing::debug!(url = %product.url, "found product image url");
        Ok(update_thumb(product, absolute.to_string()))
    }
}
