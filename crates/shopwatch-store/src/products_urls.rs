//! Repository for the externally supplied product-URL list.
//!
//! A plain text file, one product URL per line. The valid set feeds shop
//! reconciliation; everything else about a product is learned by scraping.

use std::path::PathBuf;

use shopwatch_core::Product;

use crate::linefile;
use crate::StoreError;

#[derive(Debug, Clone)]
pub struct ProductsUrlsRepo {
    path: PathBuf,
}

impl ProductsUrlsRepo {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads all valid product URLs as URL-only products with fresh UIDs.
    ///
    /// A record must begin with `http`; invalid records are dropped with a
    /// warning. An empty file yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read.
    pub fn get_all(&self) -> Result<Vec<Product>, StoreError> {
        let records = linefile::read_records(&self.path)?;
        let products = records
            .into_iter()
            .filter(|record| {
                if record.starts_with("http") {
                    true
                } else {
                    tracing::warn!(record, "invalid product URL record, no http part detected");
                    false
                }
            })
            .map(Product::from_url)
            .collect();
        Ok(products)
    }

    /// Persists the URL set of the given products, deduped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be written.
    pub fn save_all(&self, products: &[Product]) -> Result<(), StoreError> {
        let urls: Vec<String> = products
            .iter()
            .filter(|p| !p.url.is_empty())
            .map(|p| p.url.clone())
            .collect();
        linefile::write_records(&self.path, &urls)
    }

    /// Appends one product URL; a duplicate is silently not written again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read or written.
    pub fn insert(&self, url: &str) -> Result<(), StoreError> {
        linefile::append_records(&self.path, &[url.to_owned()])
    }
}

#[cfg(test)]
#[path = "products_urls_test.rs"]
mod tests;
