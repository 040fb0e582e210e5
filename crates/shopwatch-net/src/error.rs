use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("a web proxy is required but the proxy pool is empty")]
    EmptyProxyPool,

    #[error("a user agent is required but the user-agent pool is empty")]
    EmptyUserAgentPool,

    #[error("invalid proxy: {0}")]
    InvalidProxy(String),

    #[error("invalid user agent: {0}")]
    InvalidUserAgent(String),

    #[error("failed request post: no {0} given")]
    MissingPostField(&'static str),

    #[error("still failed after {tries} tries, giving up {url}")]
    RetriesExhausted { tries: u32, url: String },

    #[error("connection failed for {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] shopwatch_store::StoreError),
}
