//! Application configuration records in the document store.
//!
//! The `Config` table holds three kinds of records: a logger record
//! (`{"logger": {...}}`), the common scraper defaults
//! (`{"scraperCommon": {...}}`) and per-scraper overrides keyed by the
//! scraper URL (`{"scraperByUrl": {"<url>": {...}}}`). Lookups never fail:
//! a missing or ambiguous record falls back to the next level, ending at a
//! hard-coded rescue default.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::docstore::DocStore;
use crate::StoreError;

const CONFIG_TABLE: &str = "Config";

/// Per-scraper behaviour knobs, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperConfig {
    pub iter_sleep_from_scnds: f64,
    pub iter_sleep_to_scnds: f64,
    pub iter_sleep_steps: f64,
    pub fetch_timeout_scnds: u64,
    pub fetch_max_retries: u32,
    pub fetch_use_random_proxy: bool,
}

impl ScraperConfig {
    /// Hard-coded last-resort defaults, used when the store has no usable
    /// scraper configuration at all.
    #[must_use]
    pub fn rescue() -> Self {
        Self {
            iter_sleep_from_scnds: 20.0,
            iter_sleep_to_scnds: 30.0,
            iter_sleep_steps: 0.5,
            fetch_timeout_scnds: 8,
            fetch_max_retries: 4,
            fetch_use_random_proxy: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    pub is_console_logging: bool,
    pub console_log_level: String,
    pub is_file_logging: bool,
    pub file_log_level: String,
}

impl LoggerConfig {
    #[must_use]
    pub fn rescue() -> Self {
        Self {
            is_console_logging: true,
            console_log_level: "info".to_owned(),
            is_file_logging: false,
            file_log_level: "off".to_owned(),
        }
    }
}

#[derive(Clone)]
pub struct ConfigRepo {
    store: DocStore,
}

impl ConfigRepo {
    #[must_use]
    pub fn new(store: DocStore) -> Self {
        Self { store }
    }

    /// Returns the logger configuration, falling back to the rescue default
    /// when the record is missing or undecodable. Never fails.
    pub async fn find_logger_config(&self) -> LoggerConfig {
        match self.find_node("logger").await {
            Ok(Some(node)) => match serde_json::from_value(node) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "undecodable logger configuration, using rescue defaults");
                    LoggerConfig::rescue()
                }
            },
            Ok(None) => {
                tracing::warn!("no logger configuration stored, using rescue defaults");
                LoggerConfig::rescue()
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed reading logger configuration, using rescue defaults");
                LoggerConfig::rescue()
            }
        }
    }

    /// Returns the scraper configuration for a scraper URL.
    ///
    /// Falls back to the common record when no (or more than one) override
    /// exists for the URL, and to the rescue default after that. Never
    /// fails.
    pub async fn find_scraper_config_by_url(&self, url: &str) -> ScraperConfig {
        let docs = match self.store.load_all(CONFIG_TABLE).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(error = %e, "failed reading scraper configuration, using rescue defaults");
                return ScraperConfig::rescue();
            }
        };

        let matches: Vec<&Value> = docs
            .iter()
            .filter_map(|doc| doc.get("scraperByUrl").and_then(|node| node.get(url)))
            .collect();

        if matches.len() == 1 {
            if let Ok(config) = serde_json::from_value(matches[0].clone()) {
                tracing::debug!(url, "loaded scraper configuration");
                return config;
            }
        }
        tracing::warn!(
            url,
            found = matches.len(),
            "no single scraper configuration for URL, falling back to common defaults"
        );
        Self::common_from_docs(&docs)
    }

    /// Returns the persisted common scraper defaults, or the rescue default
    /// when they are missing. Never fails.
    pub async fn find_scraper_common_config(&self) -> ScraperConfig {
        match self.store.load_all(CONFIG_TABLE).await {
            Ok(docs) => Self::common_from_docs(&docs),
            Err(e) => {
                tracing::warn!(error = %e, "failed reading common scraper configuration, using rescue defaults");
                ScraperConfig::rescue()
            }
        }
    }

    fn common_from_docs(docs: &[Value]) -> ScraperConfig {
        let matches: Vec<&Value> = docs.iter().filter_map(|doc| doc.get("scraperCommon")).collect();
        if matches.len() == 1 {
            if let Ok(config) = serde_json::from_value(matches[0].clone()) {
                tracing::debug!("loaded common scraper configuration");
                return config;
            }
        }
        tracing::warn!(
            found = matches.len(),
            "no single common scraper configuration, using rescue defaults"
        );
        ScraperConfig::rescue()
    }

    async fn find_node(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let docs = self.store.load_all(CONFIG_TABLE).await?;
        Ok(docs.into_iter().find_map(|doc| doc.get(key).cloned()))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
