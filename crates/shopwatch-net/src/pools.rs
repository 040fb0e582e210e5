//! Proxy and user-agent pools.
//!
//! Both pools load once from their line-record files and are read-only
//! afterwards (a process restart picks up edits). `get_random` draws
//! uniformly from the valid set and is non-blocking.

use std::path::PathBuf;

use rand::Rng;

use crate::proxy::Proxy;
use crate::NetError;
use shopwatch_store::linefile;

pub struct ProxyPool {
    path: PathBuf,
    proxies: Vec<Proxy>,
}

impl ProxyPool {
    /// Loads all valid proxy records from a file; invalid records are
    /// dropped at debug level.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Store`] when the file cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, NetError> {
        let path = path.into();
        let records = linefile::read_records(&path)?;
        let proxies: Vec<Proxy> = records.iter().filter_map(|r| Proxy::parse(r)).collect();
        if proxies.is_empty() {
            tracing::warn!(path = %path.display(), "no valid proxies found; make sure the proxy file is empty if you don't need proxies");
        } else {
            tracing::debug!(path = %path.display(), count = proxies.len(), "proxy pool loaded");
        }
        Ok(Self { path, proxies })
    }

    /// Uniform random draw; `None` when the pool is empty.
    #[must_use]
    pub fn get_random(&self) -> Option<&Proxy> {
        if self.proxies.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..self.proxies.len());
        let proxy = &self.proxies[index];
        tracing::debug!(endpoint = %proxy.endpoint, port = proxy.port, "picked random proxy");
        Some(proxy)
    }

    /// Appends a proxy to the pool and its backing file.
    ///
    /// A proxy already in the pool is silently not written a second time.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidProxy`] for a proxy with invalid fields
    /// and [`NetError::Store`] when the file cannot be written.
    pub fn insert(&mut self, proxy: Proxy) -> Result<(), NetError> {
        if !proxy.is_valid() {
            return Err(NetError::InvalidProxy(format!(
                "not added to the pool, one or more invalid fields: {}, {}, {}:{}",
                proxy.scheme, proxy.username, proxy.endpoint, proxy.port
            )));
        }
        if self.proxies.contains(&proxy) {
            return Ok(());
        }
        linefile::append_records(&self.path, &[proxy.to_line()])?;
        self.proxies.push(proxy);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

pub struct UserAgentPool {
    path: PathBuf,
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Loads all user agents from a file (one per line, `#` comments).
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Store`] when the file cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, NetError> {
        let path = path.into();
        let agents = linefile::read_records(&path)?;
        if agents.is_empty() {
            tracing::warn!(path = %path.display(), "no valid user agents found; make sure the user-agent file is empty if you don't need them");
        } else {
            tracing::debug!(path = %path.display(), count = agents.len(), "user-agent pool loaded");
        }
        Ok(Self { path, agents })
    }

    /// Uniform random draw; `None` when the pool is empty.
    #[must_use]
    pub fn get_random(&self) -> Option<&str> {
        if self.agents.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..self.agents.len());
        Some(self.agents[index].as_str())
    }

    /// Appends a user agent to the pool and its backing file; duplicates
    /// are silently skipped.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidUserAgent`] for an empty or commented
    /// line and [`NetError::Store`] when the file cannot be written.
    pub fn insert(&mut self, agent: &str) -> Result<(), NetError> {
        let agent = agent.trim();
        if agent.is_empty() || agent.starts_with('#') {
            return Err(NetError::InvalidUserAgent(agent.to_owned()));
        }
        if self.agents.iter().any(|a| a == agent) {
            return Ok(());
        }
        linefile::append_records(&self.path, &[agent.to_owned()])?;
        self.agents.push(agent.to_owned());
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
#[path = "pools_test.rs"]
mod tests;
