//! Process bootstrap configuration from environment variables.
//!
//! Only paths and the shutdown window live here; scraping behaviour is
//! configured through the document store's `Config` table.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub products_urls_path: PathBuf,
    pub proxies_path: PathBuf,
    pub user_agents_path: PathBuf,
    pub shutdown_window_secs: u64,
}

/// Load configuration from the process environment (after `.env` loading).
///
/// # Errors
///
/// Fails when a numeric variable does not parse.
pub fn load_from_env() -> anyhow::Result<AppConfig> {
    build_config(|key| std::env::var(key).ok())
}

fn build_config<F>(lookup: F) -> anyhow::Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let data_dir = PathBuf::from(
        lookup("SHOPWATCH_DATA_DIR").unwrap_or_else(|| "./userdata".to_owned()),
    );

    let shutdown_window_secs = match lookup("SHOPWATCH_SHUTDOWN_WINDOW_SECS") {
        Some(raw) => raw.parse().map_err(|e| {
            anyhow::anyhow!("invalid SHOPWATCH_SHUTDOWN_WINDOW_SECS \"{raw}\": {e}")
        })?,
        None => 30,
    };

    Ok(AppConfig {
        database_path: data_dir.join("shopwatch.db"),
        products_urls_path: data_dir.join("ProductsURLs.txt"),
        proxies_path: data_dir.join("Proxies.txt"),
        user_agents_path: data_dir.join("UserAgents.txt"),
        data_dir,
        shutdown_window_secs,
    })
}

impl AppConfig {
    /// Creates the data directory and empty record files where missing, so
    /// a fresh install starts up instead of erroring on absent files.
    ///
    /// # Errors
    ///
    /// Fails when the directory or a file cannot be created.
    pub fn ensure_data_files(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        for path in [
            &self.products_urls_path,
            &self.proxies_path,
            &self.user_agents_path,
        ] {
            if !path.is_file() {
                std::fs::File::create(path)?;
            }
        }
        Ok(())
    }
}
