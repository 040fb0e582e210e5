//! Webhook payload shapes.
//!
//! Outbound JSON follows the common webhook "embed" structure; only
//! populated keys are serialized.

use serde::Serialize;
use shopwatch_core::{Product, Shop};

const EMBED_FOOTER: &str = "shopwatch";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<Footer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footer {
    pub text: String,
}

/// Builds the product-update embed.
///
/// A `Price` field appears iff the base price is known; a `Sizes` field
/// lists every in-stock size joined by newlines and is omitted when
/// nothing is in stock.
#[must_use]
pub fn product_payload(username: &str, product: &Product, shop: &Shop) -> WebhookPayload {
    let mut fields = Vec::new();

    if product.base_price.is_some() {
        fields.push(EmbedField {
            name: "Price".to_owned(),
            value: product.price_with_currency(),
        });
    }

    let in_stock: Vec<&str> = product
        .sizes
        .iter()
        .filter(|size| size.is_in_stock == Some(true))
        .filter_map(|size| size.size_eu.as_deref())
        .collect();
    if !in_stock.is_empty() {
        fields.push(EmbedField {
            name: "Sizes".to_owned(),
            value: in_stock.join("\n"),
        });
    }

    let embed = Embed {
        title: Some(product.name.clone()),
        description: Some(shop.name.clone()),
        url: Some(product.url.clone()),
        thumbnail: product
            .url_thumb
            .clone()
            .map(|url| Thumbnail { url }),
        fields,
        footer: Some(Footer {
            text: EMBED_FOOTER.to_owned(),
        }),
    };

    WebhookPayload {
        username: username.to_owned(),
        content: String::new(),
        embeds: vec![embed],
    }
}

/// Content-only payload with the log marker.
#[must_use]
pub fn log_payload(username: &str, message: &str) -> WebhookPayload {
    WebhookPayload {
        username: username.to_owned(),
        content: format!("\u{1f539}{message}"),
        embeds: Vec::new(),
    }
}

/// Content-only payload with the error marker.
#[must_use]
pub fn error_payload(username: &str, message: &str) -> WebhookPayload {
    WebhookPayload {
        username: username.to_owned(),
        content: format!("\u{2757}{message}"),
        embeds: Vec::new(),
    }
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod tests;
