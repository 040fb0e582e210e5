//! Webhook notification dispatcher.
//!
//! Resolves the endpoint and per-channel credentials from the messengers
//! store, builds the payload and POSTs it through its own requester,
//! configured per channel. Delivery is fire-and-forget: every failure is
//! logged and swallowed so a scrape driver never stalls on notification.
//! Ordering and at-least-once delivery are explicitly not guaranteed; a
//! dropped message is recovered by the next tick if the change persists.

pub mod payload;

use std::sync::Arc;

use shopwatch_core::{Product, Shop};
use shopwatch_net::{Params, RequestPolicy, Requester, Session};
use shopwatch_store::{MessengerConfig, MessengersRepo};
use thiserror::Error;

use crate::payload::WebhookPayload;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Store(#[from] shopwatch_store::StoreError),

    #[error(transparent)]
    Net(#[from] shopwatch_net::NetError),

    #[error("payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct Notifier {
    session: Arc<Session>,
    repo: MessengersRepo,
}

impl Notifier {
    #[must_use]
    pub fn new(session: Arc<Session>, repo: MessengersRepo) -> Self {
        Self { session, repo }
    }

    /// Emits a product-update notification. Failures are logged, never
    /// returned.
    pub async fn send_product(&self, product: &Product, shop: &Shop) {
        let result = self.send_product_inner(product, shop).await;
        if let Err(e) = result {
            tracing::warn!(error = %e, url = %product.url, "product notification dropped");
        }
    }

    /// Emits a plain log line to the log channel.
    pub async fn send_log(&self, message: &str) {
        let result = self.send_log_inner(message).await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "log notification dropped");
        }
    }

    /// Emits an error line to the error channel.
    pub async fn send_error(&self, message: &str) {
        let result = self.send_error_inner(message).await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "error notification dropped");
        }
    }

    async fn send_product_inner(&self, product: &Product, shop: &Shop) -> Result<(), NotifyError> {
        let config = self.repo.find_product_message_config().await?;
        let payload = payload::product_payload(&config.username, product, shop);
        self.deliver(&config, &payload).await
    }

    async fn send_log_inner(&self, message: &str) -> Result<(), NotifyError> {
        let config = self.repo.find_log_message_config().await?;
        let payload = payload::log_payload(&config.username, message);
        self.deliver(&config, &payload).await
    }

    async fn send_error_inner(&self, message: &str) -> Result<(), NotifyError> {
        let config = self.repo.find_error_message_config().await?;
        let payload = payload::error_payload(&config.username, message);
        self.deliver(&config, &payload).await
    }

    async fn deliver(
        &self,
        config: &MessengerConfig,
        payload: &WebhookPayload,
    ) -> Result<(), NotifyError> {
        let endpoint = self.repo.find_webhook_api_endpoint().await?;
        let url = format!(
            "{}/{}/{}",
            endpoint.trim_end_matches('/'),
            config.user,
            config.token
        );

        let requester = Requester::with_policy(
            self.session.clone(),
            RequestPolicy {
                timeout_secs: config.timeout,
                max_retries: config.max_retries,
                use_random_proxy: config.use_random_proxy,
            },
        );

        let (content_type, value) = shopwatch_net::request::json_content_type();
        let params = Params::post(url, serde_json::to_value(payload)?)
            .with_header(content_type, value);
        requester.post(&params).await?;
        tracing::debug!(channel = %config.config_name, "webhook notification delivered");
        Ok(())
    }
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
