//! Messenger configuration records.
//!
//! The `Messengers` table holds per-channel webhook credentials keyed by
//! `configName`, plus one endpoint record keyed by `apiType == "webhook"`.

use serde::{Deserialize, Serialize};

use crate::docstore::DocStore;
use crate::StoreError;

const MESSENGERS_TABLE: &str = "Messengers";

pub const PRODUCT_MSG_CONFIG: &str = "product-msg-config";
pub const LOG_MSG_CONFIG: &str = "log-msg-config";
pub const ERROR_MSG_CONFIG: &str = "error-msg-config";

/// One webhook channel: routing credentials plus the request policy to use
/// when delivering to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessengerConfig {
    pub config_name: String,
    pub user: String,
    pub token: String,
    pub timeout: u64,
    pub max_retries: u32,
    pub use_random_proxy: bool,
    pub username: String,
}

#[derive(Clone)]
pub struct MessengersRepo {
    store: DocStore,
}

impl MessengersRepo {
    #[must_use]
    pub fn new(store: DocStore) -> Self {
        Self { store }
    }

    /// Returns the configured webhook API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoMatch`] when no webhook endpoint record
    /// exists.
    pub async fn find_webhook_api_endpoint(&self) -> Result<String, StoreError> {
        let docs = self
            .store
            .find_where_eq(MESSENGERS_TABLE, "apiType", "webhook")
            .await?;
        docs.first()
            .and_then(|doc| doc.get("apiEndpoint"))
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| StoreError::NoMatch {
                table: MESSENGERS_TABLE.to_owned(),
                field: "apiType".to_owned(),
                value: "webhook".to_owned(),
            })
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NoMatch`] when the config is absent.
    pub async fn find_product_message_config(&self) -> Result<MessengerConfig, StoreError> {
        self.find_message_config(PRODUCT_MSG_CONFIG).await
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NoMatch`] when the config is absent.
    pub async fn find_log_message_config(&self) -> Result<MessengerConfig, StoreError> {
        self.find_message_config(LOG_MSG_CONFIG).await
    }

    /// # Errors
    ///
    /// Returns [`StoreError::NoMatch`] when the config is absent.
    pub async fn find_error_message_config(&self) -> Result<MessengerConfig, StoreError> {
        self.find_message_config(ERROR_MSG_CONFIG).await
    }

    async fn find_message_config(&self, config_name: &str) -> Result<MessengerConfig, StoreError> {
        let docs = self
            .store
            .find_where_eq(MESSENGERS_TABLE, "configName", config_name)
            .await?;
        let doc = docs.first().ok_or_else(|| StoreError::NoMatch {
            table: MESSENGERS_TABLE.to_owned(),
            field: "configName".to_owned(),
            value: config_name.to_owned(),
        })?;
        serde_json::from_value(doc.clone()).map_err(|e| StoreError::Malformed {
            table: MESSENGERS_TABLE.to_owned(),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "messengers_test.rs"]
mod tests;
