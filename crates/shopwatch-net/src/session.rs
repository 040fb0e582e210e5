//! Shared HTTP session.
//!
//! One session per process. It owns the proxy-less base client plus one
//! lazily-built client per proxy URL, since reqwest fixes the proxy at client
//! construction, so rotating proxies means rotating pooled clients. All
//! clients (and their connection pools) are shared across every requester
//! borrowing the session.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Client;

use crate::pools::{ProxyPool, UserAgentPool};
use crate::proxy::Proxy;
use crate::NetError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Session {
    base: Client,
    proxied: Mutex<HashMap<String, Client>>,
    proxies: ProxyPool,
    agents: UserAgentPool,
}

impl Session {
    /// Builds the session and its base client.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Http`] if the underlying client cannot be
    /// constructed (e.g. invalid TLS setup).
    pub fn new(proxies: ProxyPool, agents: UserAgentPool) -> Result<Self, NetError> {
        let base = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        tracing::debug!("http session initialized");
        Ok(Self {
            base,
            proxied: Mutex::new(HashMap::new()),
            proxies,
            agents,
        })
    }

    /// Draws a random proxy.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::EmptyProxyPool`] when none are configured.
    pub fn random_proxy(&self) -> Result<&Proxy, NetError> {
        self.proxies.get_random().ok_or(NetError::EmptyProxyPool)
    }

    /// Draws a random user agent.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::EmptyUserAgentPool`] when none are configured.
    pub fn random_user_agent(&self) -> Result<&str, NetError> {
        self.agents.get_random().ok_or(NetError::EmptyUserAgentPool)
    }

    /// Returns the client routing through the given proxy (or the base
    /// client for `None`), building and caching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidProxy`] for an unusable proxy record and
    /// [`NetError::Http`] if the client cannot be constructed.
    pub(crate) fn client_for(&self, proxy: Option<&Proxy>) -> Result<Client, NetError> {
        let Some(proxy) = proxy else {
            return Ok(self.base.clone());
        };

        let key = proxy.request_url()?;
        if let Some(client) = self.proxied.lock().get(&key) {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .proxy(reqwest::Proxy::all(key.as_str())?)
            .build()?;
        tracing::debug!(endpoint = %proxy.endpoint, port = proxy.port, "proxied client built");
        self.proxied.lock().insert(key, client.clone());
        Ok(client)
    }
}
