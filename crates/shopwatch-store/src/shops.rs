//! Shop repository.
//!
//! Owns the persisted shop set. Scrape drivers read a snapshot at tick
//! start, mutate it in memory and hand it back through [`ShopRepo::update`];
//! the underlying document store serializes all writers.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use shopwatch_core::{netloc_of, shop_url_of, Product, Shop};
use uuid::Uuid;

use crate::docstore::DocStore;
use crate::products_urls::ProductsUrlsRepo;
use crate::StoreError;

const SHOPS_TABLE: &str = "Shops";

#[derive(Clone)]
pub struct ShopRepo {
    store: DocStore,
}

impl ShopRepo {
    #[must_use]
    pub fn new(store: DocStore) -> Self {
        Self { store }
    }

    /// Returns all shops with their products and sizes, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on query failure and
    /// [`StoreError::Malformed`] on an undecodable record.
    pub async fn get_all(&self) -> Result<Vec<Shop>, StoreError> {
        let docs = self.store.load_all(SHOPS_TABLE).await?;
        docs.into_iter().map(|doc| decode_shop(&doc)).collect()
    }

    /// Replaces the whole shops table atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on write failure.
    pub async fn set_all(&self, shops: &[Shop]) -> Result<(), StoreError> {
        let docs = shops
            .iter()
            .map(|shop| encode_shop(shop))
            .collect::<Result<Vec<_>, _>>()?;
        self.store.replace_all(SHOPS_TABLE, &docs).await
    }

    /// Replaces the persisted record matching the shop's uid.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::NotFound`] / [`StoreError::AmbiguousUid`]
    /// when the uid matches zero or multiple records.
    pub async fn update(&self, shop: &Shop) -> Result<(), StoreError> {
        let doc = encode_shop(shop)?;
        self.store
            .update_where_uid(SHOPS_TABLE, &shop.uid.to_string(), &doc)
            .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on query failure.
    pub async fn find_by_uid(&self, uid: Uuid) -> Result<Option<Shop>, StoreError> {
        let docs = self
            .store
            .find_where_eq(SHOPS_TABLE, "uid", &uid.to_string())
            .await?;
        docs.first().map(decode_shop).transpose()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on query failure.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Shop>, StoreError> {
        let docs = self.store.find_where_eq(SHOPS_TABLE, "name", name).await?;
        docs.iter().map(decode_shop).collect()
    }

    /// Reconciles the persisted shop set against the product-URL list.
    ///
    /// Idempotent. Product URLs are grouped by netloc; each group is one
    /// shop. Existing shops keep their identity (uid, name, scan stamp) and
    /// the scrape history of every product whose URL is still listed; new
    /// URLs join with fresh UIDs, delisted URLs are dropped, and shops whose
    /// netloc no longer appears are deleted entirely. Commits via
    /// [`ShopRepo::set_all`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the URL list cannot be read, or a
    /// storage error from the commit.
    pub async fn update_from_products_urls(
        &self,
        products_urls: &ProductsUrlsRepo,
    ) -> Result<(), StoreError> {
        let listed = products_urls.get_all()?;

        // Group candidate products by netloc, preserving first appearance.
        let mut group_order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, (String, Vec<Product>)> = HashMap::new();
        for product in listed {
            let (Some(netloc), Some(shop_url)) =
                (netloc_of(&product.url), shop_url_of(&product.url))
            else {
                tracing::warn!(url = %product.url, "product URL not splittable into a netloc, skipping");
                continue;
            };
            let entry = groups
                .entry(netloc.clone())
                .or_insert_with(|| (shop_url, Vec::new()));
            entry.1.push(product);
            if !group_order.contains(&netloc) {
                group_order.push(netloc);
            }
        }

        let mut existing: HashMap<String, Shop> = HashMap::new();
        for shop in self.get_all().await? {
            match shop.netloc() {
                Some(netloc) => {
                    existing.insert(netloc, shop);
                }
                None => {
                    tracing::warn!(url = %shop.url, "persisted shop has no netloc, dropping");
                }
            }
        }

        let mut next: Vec<Shop> = Vec::new();
        for netloc in group_order {
            let Some((shop_url, candidates)) = groups.remove(&netloc) else {
                continue;
            };

            match existing.remove(&netloc) {
                Some(mut shop) => {
                    let wanted: HashSet<&str> =
                        candidates.iter().map(|p| p.url.as_str()).collect();
                    shop.products.retain(|p| wanted.contains(p.url.as_str()));
                    for product in candidates {
                        // Kept products win over fresh candidates by URL dedupe.
                        shop.add_product(product);
                    }
                    next.push(shop);
                }
                None => {
                    let mut shop = Shop::new(shop_url);
                    for product in candidates {
                        shop.add_product(product);
                    }
                    tracing::debug!(url = %shop.url, products = shop.products.len(), "new shop derived from product URLs");
                    next.push(shop);
                }
            }
        }

        for dropped in existing.values() {
            tracing::info!(url = %dropped.url, "shop no longer backed by any product URL, deleting");
        }

        self.set_all(&next).await
    }
}

fn encode_shop(shop: &Shop) -> Result<Value, StoreError> {
    serde_json::to_value(shop).map_err(|e| StoreError::Malformed {
        table: SHOPS_TABLE.to_owned(),
        source: e,
    })
}

fn decode_shop(doc: &Value) -> Result<Shop, StoreError> {
    serde_json::from_value(doc.clone()).map_err(|e| StoreError::Malformed {
        table: SHOPS_TABLE.to_owned(),
        source: e,
    })
}

#[cfg(test)]
#[path = "shops_test.rs"]
mod tests;
