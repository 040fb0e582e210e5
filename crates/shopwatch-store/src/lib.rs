pub mod config;
pub mod docstore;
pub mod linefile;
pub mod messengers;
pub mod products_urls;
pub mod shops;

pub use config::{ConfigRepo, LoggerConfig, ScraperConfig};
pub use docstore::DocStore;
pub use messengers::{MessengerConfig, MessengersRepo};
pub use products_urls::ProductsUrlsRepo;
pub use shops::ShopRepo;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no record in table {table} for uid {uid}")]
    NotFound { table: String, uid: String },

    #[error("ambiguous update in table {table}: {count} records share uid {uid}")]
    AmbiguousUid {
        table: String,
        uid: String,
        count: i64,
    },

    #[error("no record in table {table} where {field} = {value}")]
    NoMatch {
        table: String,
        field: String,
        value: String,
    },

    #[error("malformed document in table {table}: {source}")]
    Malformed {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}
