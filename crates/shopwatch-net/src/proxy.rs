//! Proxy records.
//!
//! The line grammar is `endpoint:port` or `endpoint:port:user:password`
//! (exactly one or three colons). None of the fields may contain `#`, `:`
//! or whitespace; username and password come together or not at all.

use crate::NetError;

#[derive(Clone, PartialEq, Eq)]
pub struct Proxy {
    pub scheme: String,
    pub endpoint: String,
    pub port: u16,
    pub username: String,
    password: String,
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("scheme", &self.scheme)
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl Proxy {
    /// Creates an unauthenticated http proxy.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: "http".to_owned(),
            endpoint: endpoint.into(),
            port,
            username: String::new(),
            password: String::new(),
        }
    }

    /// Creates an authenticated http proxy.
    #[must_use]
    pub fn with_auth(
        endpoint: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            scheme: "http".to_owned(),
            endpoint: endpoint.into(),
            port,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parses one proxy record line; invalid lines yield `None`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        if line.is_empty() || line.starts_with('#') || line.starts_with(':') {
            return None;
        }
        if line.contains(char::is_whitespace) {
            tracing::debug!(line, "proxy record contains whitespace, dropped");
            return None;
        }

        let parts: Vec<&str> = line.split(':').collect();
        let proxy = match parts.as_slice() {
            [endpoint, port] => Self::new(*endpoint, parse_port(port)?),
            [endpoint, port, username, password] => {
                Self::with_auth(*endpoint, parse_port(port)?, *username, *password)
            }
            _ => {
                tracing::debug!(line, "proxy record must have 1 or 3 colons, dropped");
                return None;
            }
        };

        if proxy.is_valid() {
            Some(proxy)
        } else {
            tracing::debug!(line, "proxy record failed validation, dropped");
            None
        }
    }

    /// Renders the record line form, `endpoint:port[:user:password]`.
    #[must_use]
    pub fn to_line(&self) -> String {
        if self.has_auth() {
            format!(
                "{}:{}:{}:{}",
                self.endpoint, self.port, self.username, self.password
            )
        } else {
            format!("{}:{}", self.endpoint, self.port)
        }
    }

    /// Builds the URL form used to route a request,
    /// `scheme://[user:password@]endpoint:port/`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::InvalidProxy`] when one or more fields are
    /// invalid or missing.
    pub fn request_url(&self) -> Result<String, NetError> {
        if !self.is_valid() {
            return Err(NetError::InvalidProxy(format!(
                "one or more invalid or missing values: {}, {}, {}:{}",
                self.scheme, self.username, self.endpoint, self.port
            )));
        }
        if self.has_auth() {
            Ok(format!(
                "{}://{}:{}@{}:{}/",
                self.scheme, self.username, self.password, self.endpoint, self.port
            ))
        } else {
            Ok(format!("{}://{}:{}/", self.scheme, self.endpoint, self.port))
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        if self.scheme != "http" && self.scheme != "https" {
            return false;
        }
        if self.endpoint.is_empty() || self.port == 0 {
            return false;
        }
        // Username and password come together or not at all.
        if self.username.is_empty() != self.password.is_empty() {
            return false;
        }
        for field in [
            &self.scheme,
            &self.endpoint,
            &self.username,
            &self.password,
        ] {
            if field.contains('#') || field.contains(':') || field.contains(char::is_whitespace) {
                return false;
            }
        }
        true
    }

    fn has_auth(&self) -> bool {
        !self.username.is_empty() || !self.password.is_empty()
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => {
            tracing::debug!(raw, "invalid proxy port, dropped");
            None
        }
        Ok(port) => Some(port),
    }
}

#[cfg(test)]
#[path = "proxy_test.rs"]
mod tests;
