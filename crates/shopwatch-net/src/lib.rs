pub mod backoff;
pub mod error;
pub mod pools;
pub mod proxy;
pub mod request;
pub mod session;

pub use backoff::rand_between;
pub use error::NetError;
pub use pools::{ProxyPool, UserAgentPool};
pub use proxy::Proxy;
pub use request::{Params, Requester, RequestPolicy, Response};
pub use session::Session;
