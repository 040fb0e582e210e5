//! Retrying request layer.
//!
//! A [`Requester`] is configured once by its owner and reused for every
//! call. Each attempt draws a fresh user agent (and proxy, when enabled)
//! from the session pools. Retry classes:
//!
//! | outcome | reaction |
//! |---|---|
//! | status 200 (GET) / 200 or 204 (POST) | success |
//! | any other status | sleep random 1.0–3.0 s (step 0.3), retry |
//! | connect / proxy-layer failure | sleep 0.25 s, retry with fresh proxy |
//! | timeout | sleep random 1.0–3.0 s, retry |
//! | any other transport error | fail immediately, no retry |
//!
//! The retry budget is per call chain; exhausting it surfaces as
//! [`NetError::RetriesExhausted`], never as a panic.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;

use crate::backoff::{rand_between, sleep_secs, PROXY_RETRY_DELAY, STATUS_RETRY_RANGE};
use crate::session::Session;
use crate::NetError;

/// Per-requester configuration, set once via [`Requester::configure`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestPolicy {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub use_random_proxy: bool,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 0,
            use_random_proxy: true,
        }
    }
}

/// Per-call parameters.
#[derive(Debug, Clone, Default)]
pub struct Params {
    pub url: String,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl Params {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            body: Some(body),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A successful response envelope. Error outcomes travel as [`NetError`];
/// callers never see a half-filled response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub text: String,
}

pub struct Requester {
    session: Arc<Session>,
    policy: RequestPolicy,
}

impl Requester {
    #[must_use]
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            policy: RequestPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(session: Arc<Session>, policy: RequestPolicy) -> Self {
        Self { session, policy }
    }

    pub fn configure(&mut self, policy: RequestPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn policy(&self) -> RequestPolicy {
        self.policy
    }

    /// HTTP GET with the retry classes above.
    ///
    /// # Errors
    ///
    /// [`NetError::EmptyUserAgentPool`] / [`NetError::EmptyProxyPool`] when
    /// a required pool is empty, [`NetError::RetriesExhausted`] when the
    /// budget runs out, [`NetError::Connection`] for a non-retriable
    /// transport failure.
    pub async fn fetch(&self, params: &Params) -> Result<Response, NetError> {
        let mut calls: u32 = 0;
        loop {
            calls += 1;
            if calls > self.policy.max_retries + 1 {
                tracing::error!(url = %params.url, tries = calls - 1, "GET still failing, giving up");
                return Err(NetError::RetriesExhausted {
                    tries: calls - 1,
                    url: params.url.clone(),
                });
            }

            let outcome = self.attempt(params, reqwest::Method::GET).await?;
            match outcome {
                Attempt::Success(response) => {
                    tracing::debug!(status = response.status, url = %params.url, "GET response");
                    return Ok(response);
                }
                Attempt::BadStatus(status) => {
                    let (from, to, step) = STATUS_RETRY_RANGE;
                    let delay = rand_between(from, to, step);
                    tracing::debug!(status, delay, url = %params.url, "GET bad status, retrying after delay");
                    sleep_secs(delay).await;
                }
                Attempt::ConnectFailed => {
                    tokio::time::sleep(PROXY_RETRY_DELAY).await;
                }
                Attempt::TimedOut => {
                    let (from, to, step) = STATUS_RETRY_RANGE;
                    let delay = rand_between(from, to, step);
                    tracing::debug!(delay, url = %params.url, "GET timeout, retrying after delay");
                    sleep_secs(delay).await;
                }
            }
        }
    }

    /// HTTP POST with a JSON body and the same retry classes; 200 and 204
    /// both count as success.
    ///
    /// # Errors
    ///
    /// [`NetError::MissingPostField`] when headers or body are missing,
    /// otherwise as [`Requester::fetch`].
    pub async fn post(&self, params: &Params) -> Result<Response, NetError> {
        if params.headers.is_empty() {
            return Err(NetError::MissingPostField("headers"));
        }
        if params.body.is_none() {
            return Err(NetError::MissingPostField("data"));
        }

        let mut calls: u32 = 0;
        loop {
            calls += 1;
            if calls > self.policy.max_retries + 1 {
                tracing::error!(url = %params.url, tries = calls - 1, "POST still failing, giving up");
                return Err(NetError::RetriesExhausted {
                    tries: calls - 1,
                    url: params.url.clone(),
                });
            }

            match self.attempt(params, reqwest::Method::POST).await? {
                Attempt::Success(response) => {
                    tracing::debug!(status = response.status, url = %params.url, "POST response");
                    return Ok(response);
                }
                Attempt::BadStatus(status) => {
                    let (from, to, step) = STATUS_RETRY_RANGE;
                    let delay = rand_between(from, to, step);
                    tracing::debug!(status, delay, url = %params.url, "POST bad status, retrying after delay");
                    sleep_secs(delay).await;
                }
                Attempt::ConnectFailed => {
                    tokio::time::sleep(PROXY_RETRY_DELAY).await;
                }
                Attempt::TimedOut => {
                    let (from, to, step) = STATUS_RETRY_RANGE;
                    let delay = rand_between(from, to, step);
                    tracing::debug!(delay, url = %params.url, "POST timeout, retrying after delay");
                    sleep_secs(delay).await;
                }
            }
        }
    }

    fn effective_timeout(&self, url: &str) -> u64 {
        if self.policy.timeout_secs == 0 {
            tracing::warn!(url = %url, "no timeout was given, falling back to timeout=10");
            return 10;
        }
        self.policy.timeout_secs
    }

    /// One attempt: draw pools, build the request, classify the outcome.
    async fn attempt(&self, params: &Params, method: reqwest::Method) -> Result<Attempt, NetError> {
        let agent = self.session.random_user_agent()?.to_owned();
        let proxy = if self.policy.use_random_proxy {
            Some(self.session.random_proxy()?.clone())
        } else {
            None
        };
        let client = self.session.client_for(proxy.as_ref())?;

        let mut headers = build_headers(&params.headers);
        // The drawn agent overrides any caller-supplied User-Agent header.
        let agent_value = HeaderValue::from_str(&agent)
            .map_err(|_| NetError::InvalidUserAgent(agent.clone()))?;
        headers.insert(USER_AGENT, agent_value);

        let is_post = method == reqwest::Method::POST;
        let mut request = client
            .request(method, params.url.as_str())
            .timeout(Duration::from_secs(self.effective_timeout(&params.url)))
            .headers(headers);
        if let Some(body) = &params.body {
            request = request.json(body);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                let success = status == StatusCode::OK
                    || (is_post && status == StatusCode::NO_CONTENT);
                if success {
                    let text = if is_post {
                        String::new()
                    } else {
                        response.text().await.map_err(|e| NetError::Connection {
                            url: params.url.clone(),
                            source: e,
                        })?
                    };
                    Ok(Attempt::Success(Response {
                        status: status.as_u16(),
                        text,
                    }))
                } else {
                    Ok(Attempt::BadStatus(status.as_u16()))
                }
            }
            Err(e) if e.is_connect() => {
                // Refused connections and proxy-layer failures look the same
                // at this level; the retry draws a fresh proxy either way.
                tracing::debug!(error = %e, url = %params.url, "connect error, retrying instantly");
                Ok(Attempt::ConnectFailed)
            }
            Err(e) if e.is_timeout() => Ok(Attempt::TimedOut),
            Err(e) => {
                tracing::error!(error = %e, url = %params.url, "request error, won't retry");
                Err(NetError::Connection {
                    url: params.url.clone(),
                    source: e,
                })
            }
        }
    }
}

enum Attempt {
    Success(Response),
    BadStatus(u16),
    ConnectFailed,
    TimedOut,
}

fn build_headers(pairs: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let Ok(name) = name.parse::<HeaderName>() else {
            tracing::warn!(name = %name, "invalid header name, skipped");
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value) else {
            tracing::warn!(name = %name, "invalid header value, skipped");
            continue;
        };
        headers.insert(name, value);
    }
    headers
}

/// Standard JSON content-type header pair for POST payloads.
#[must_use]
pub fn json_content_type() -> (String, String) {
    (
        CONTENT_TYPE.as_str().to_owned(),
        "application/json".to_owned(),
    )
}
