use thiserror::Error;

/// A hook could not locate or decode the page fragment it is responsible
/// for. The driver turns this into a warning plus a fail-count increment;
/// it never aborts a tick.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no matches in HTML tree for {0}")]
    Missing(&'static str),

    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("expected to find an extractor but found none, shop URL is {url}")]
    NoMatch { url: String },

    #[error("expected one single extractor but got {count}, shop URL is {url}")]
    Ambiguous { url: String, count: usize },
}
