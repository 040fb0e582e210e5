pub mod driver;
pub mod error;
pub mod extract;
pub mod registry;
pub mod sites;
pub mod sizes;

pub use driver::{build_drivers, ShopDriver};
pub use error::{ExtractError, RegistryError};
pub use extract::Extractor;
pub use registry::Registry;
pub use sizes::apply_size_observation;
