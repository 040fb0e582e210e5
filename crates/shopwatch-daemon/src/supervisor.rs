//! Scrape-loop supervision and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use shopwatch_scraper::ShopDriver;

/// Runs all driver loops until they finish on their own or a shutdown
/// signal arrives. On signal, the stop flag is broadcast and the loops get
/// one bounded window to complete their current tick.
pub async fn run(drivers: Vec<Arc<ShopDriver>>, shutdown_window: Duration) {
    tracing::info!(count = drivers.len(), "starting scrape loops");

    let handles: Vec<_> = drivers
        .iter()
        .map(|driver| {
            let driver = Arc::clone(driver);
            tokio::spawn(async move { driver.loop_run().await })
        })
        .collect();
    let mut all_done = Box::pin(join_all(handles));

    tokio::select! {
        _ = &mut all_done => {
            tracing::info!("all scrape loops finished");
            return;
        }
        () = shutdown_signal() => {}
    }

    tracing::info!("broadcasting stop to all scrapers");
    for driver in &drivers {
        driver.stop();
    }

    if tokio::time::timeout(shutdown_window, all_done).await.is_err() {
        tracing::warn!(
            window_secs = shutdown_window.as_secs(),
            "shutdown window elapsed with scrapers still running, abandoning them"
        );
    } else {
        tracing::info!("all scrapers stopped cleanly");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
