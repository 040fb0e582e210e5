mod config;
mod supervisor;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use shopwatch_net::{ProxyPool, Session, UserAgentPool};
use shopwatch_notify::Notifier;
use shopwatch_scraper::{build_drivers, Registry};
use shopwatch_store::{ConfigRepo, DocStore, MessengersRepo, ProductsUrlsRepo, ShopRepo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = config::load_from_env()?;
    config.ensure_data_files()?;

    let store = DocStore::open(&config.database_path).await?;

    // Log level comes from the stored logger config; RUST_LOG overrides.
    let logger = ConfigRepo::new(store.clone()).find_logger_config().await;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(logger.console_log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(data_dir = %config.data_dir.display(), "shopwatch initialized");

    // Align the shop set with the externally supplied product-URL list.
    let shop_repo = ShopRepo::new(store.clone());
    let products_urls = ProductsUrlsRepo::new(&config.products_urls_path);
    shop_repo.update_from_products_urls(&products_urls).await?;
    let shops = shop_repo.get_all().await?;
    tracing::info!(count = shops.len(), "shops reconciled from product URLs");

    let session = Arc::new(Session::new(
        ProxyPool::load(&config.proxies_path)?,
        UserAgentPool::load(&config.user_agents_path)?,
    )?);

    let notifier = Arc::new(Notifier::new(
        Arc::clone(&session),
        MessengersRepo::new(store.clone()),
    ));

    let registry = Registry::builtin();
    let configs = ConfigRepo::new(store.clone());
    let drivers = build_drivers(
        &registry,
        shops,
        &shop_repo,
        &session,
        Some(notifier),
        &configs,
    )
    .await;
    if drivers.is_empty() {
        anyhow::bail!("no scrapers were generated; check the products-URLs file against the registry");
    }

    supervisor::run(drivers, Duration::from_secs(config.shutdown_window_secs)).await;

    // Dropping the last session handle drains the connection pools.
    drop(session);
    tracing::info!("http session closed, shutdown complete");
    Ok(())
}
