//! Per-shop scrape driver.
//!
//! One driver owns one shop. A tick fetches the shop landing page and all
//! product pages concurrently, runs the extractor hooks over each parsed
//! document, commits the shop snapshot on any change and emits a product
//! notification per changed product. Failures of any kind stay local to
//! their fetch or hook; the tick always runs to completion.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::Mutex;
use scraper::Html;
use shopwatch_core::Shop;
use shopwatch_net::{rand_between, Params, RequestPolicy, Requester, Session};
use shopwatch_notify::Notifier;
use shopwatch_store::{ConfigRepo, ScraperConfig, ShopRepo};

use crate::extract::Extractor;
use crate::registry::Registry;

pub struct ShopDriver {
    shop: Mutex<Shop>,
    repo: ShopRepo,
    requester: Requester,
    notifier: Option<Arc<Notifier>>,
    extractor: Box<dyn Extractor>,
    cancel: AtomicBool,
    fail_count: AtomicU32,
    /// Serializes commits within the tick. The snapshot is cloned under
    /// this lock, so a commit never overwrites a sibling task's newer
    /// state with a stale one.
    commit_lock: tokio::sync::Mutex<()>,
    /// Inter-tick sleep bounds: (min seconds, max seconds, step).
    iter_sleep: (f64, f64, f64),
}

impl ShopDriver {
    #[must_use]
    pub fn new(
        shop: Shop,
        repo: ShopRepo,
        mut requester: Requester,
        notifier: Option<Arc<Notifier>>,
        extractor: Box<dyn Extractor>,
        config: &ScraperConfig,
    ) -> Self {
        requester.configure(RequestPolicy {
            timeout_secs: config.fetch_timeout_scnds,
            max_retries: config.fetch_max_retries,
            use_random_proxy: config.fetch_use_random_proxy,
        });
        Self {
            shop: Mutex::new(shop),
            repo,
            requester,
            notifier,
            extractor,
            cancel: AtomicBool::new(false),
            fail_count: AtomicU32::new(0),
            commit_lock: tokio::sync::Mutex::new(()),
            iter_sleep: (
                config.iter_sleep_from_scnds,
                config.iter_sleep_to_scnds,
                config.iter_sleep_steps,
            ),
        }
    }

    /// A copy of the driver's current in-memory shop state.
    #[must_use]
    pub fn shop(&self) -> Shop {
        self.shop.lock().clone()
    }

    #[must_use]
    pub fn shop_url(&self) -> String {
        self.shop.lock().url.clone()
    }

    /// Cumulative hook/fetch failures over the driver's lifetime.
    #[must_use]
    pub fn fail_count(&self) -> u32 {
        self.fail_count.load(Ordering::Relaxed)
    }

    /// Requests loop exit after the current tick. In-flight requests are
    /// not interrupted; they run to their configured timeout.
    pub fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// One tick: shop page and all product pages, fetched concurrently.
    pub async fn run(&self) {
        let url = self.shop_url();
        tracing::debug!(url = %url, "scrape pass starting");
        tokio::join!(self.scan_shop(), self.scan_all_products());
        tracing::info!(
            fails = self.fail_count(),
            url = %url,
            "scrape pass completed"
        );
    }

    /// Periodic loop around [`ShopDriver::run`]; exits after the first
    /// tick that completes with the stop flag set.
    pub async fn loop_run(&self) {
        tracing::debug!(url = %self.shop_url(), "scrape loop entered");
        let mut iteration: u64 = 0;
        loop {
            iteration += 1;
            let started = Instant::now();
            self.run().await;
            tracing::info!(
                iteration,
                took_secs = started.elapsed().as_secs_f64(),
                url = %self.shop_url(),
                "iteration done"
            );

            if self.is_stopped() {
                tracing::info!(url = %self.shop_url(), "scrape loop cancelled, exiting");
                break;
            }

            let (from, to, step) = self.iter_sleep;
            let delay = rand_between(from, to, step);
            tracing::debug!(delay, url = %self.shop_url(), "waiting before next iteration");
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        }
    }

    async fn scan_shop(&self) {
        let url = self.shop_url();
        tracing::debug!(url = %url, "requesting shop page");
        let page = match self.requester.fetch(&Params::get(&url)).await {
            Ok(page) => page,
            Err(e) => {
                self.fail_count.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, url = %url, "shop page fetch failed");
                return;
            }
        };

        let changed = {
            let doc = Html::parse_document(&page.text);
            let mut shop = self.shop.lock();
            let changed = match self.extractor.set_shop_name(&doc, &mut shop) {
                Ok(changed) => changed,
                Err(e) => {
                    self.fail_count.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, url = %url, "failed parsing shop name");
                    false
                }
            };
            shop.set_last_scan_now();
            changed
        };

        if changed {
            self.commit(&url).await;
        }
    }

    async fn scan_all_products(&self) {
        let count = self.shop.lock().products.len();
        tracing::debug!(count, url = %self.shop_url(), "requesting all product pages");
        join_all((0..count).map(|index| self.scan_product(index))).await;
    }

    async fn scan_product(&self, index: usize) {
        let url = {
            let shop = self.shop.lock();
            let Some(product) = shop.products.get(index) else {
                return;
            };
            product.url.clone()
        };

        let page = match self.requester.fetch(&Params::get(&url)).await {
            Ok(page) => page,
            Err(e) => {
                self.fail_count.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, url = %url, "product page fetch failed");
                return;
            }
        };

        let (changed, product) = {
            let doc = Html::parse_document(&page.text);
            let mut shop = self.shop.lock();
            let Some(product) = shop.products.get_mut(index) else {
                return;
            };

            let mut changed = false;
            let outcomes = [
                ("name", self.extractor.set_product_name(&doc, &mut *product)),
                (
                    "sizes",
                    self.extractor.set_product_sizes(&doc, &mut *product),
                ),
                (
                    "price",
                    self.extractor.set_product_price(&doc, &mut *product),
                ),
                (
                    "thumbnail",
                    self.extractor.set_product_thumb_url(&doc, &mut *product),
                ),
                (
                    "release time",
                    self.extractor
                        .set_product_release_time(&doc, &mut *product),
                ),
            ];
            for (field, outcome) in outcomes {
                match outcome {
                    Ok(field_changed) => changed |= field_changed,
                    Err(e) => {
                        self.fail_count.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(field, error = %e, url = %url, "extractor hook failed");
                    }
                }
            }

            product.set_last_scan_now();
            let product = product.clone();
            (changed, product)
        };
        tracing::debug!(url = %url, changed, "product completed");

        if changed {
            let snapshot = self.commit(&url).await;
            if let Some(notifier) = &self.notifier {
                notifier.send_product(&product, &snapshot).await;
            }
        }
    }

    /// Commits the current in-memory shop state. Commit failures are
    /// logged, not surfaced; the next tick re-commits the same diff.
    async fn commit(&self, context_url: &str) -> Shop {
        let _serialize = self.commit_lock.lock().await;
        let snapshot = self.shop.lock().clone();
        if let Err(e) = self.repo.update(&snapshot).await {
            tracing::error!(error = %e, url = %context_url, "commit failed, retrying next tick");
        }
        snapshot
    }
}

/// Builds one driver per shop, resolving the extractor from the registry
/// and the scraper config from the config store (per-URL, then common,
/// then rescue defaults).
///
/// Shops without a matching extractor are skipped with a warning; other
/// shops continue.
pub async fn build_drivers(
    registry: &Registry,
    shops: Vec<Shop>,
    repo: &ShopRepo,
    session: &Arc<Session>,
    notifier: Option<Arc<Notifier>>,
    configs: &ConfigRepo,
) -> Vec<Arc<ShopDriver>> {
    let mut drivers = Vec::new();
    if shops.is_empty() {
        tracing::warn!("no shops were passed in, nothing to scrape");
        return drivers;
    }

    for shop in shops {
        let extractor = match registry.extractor_for(&shop.url) {
            Ok(extractor) => extractor,
            Err(e) => {
                tracing::warn!(error = %e, "skipping shop without usable extractor");
                continue;
            }
        };
        let config = configs.find_scraper_config_by_url(extractor.url()).await;
        let requester = Requester::new(Arc::clone(session));
        drivers.push(Arc::new(ShopDriver::new(
            shop,
            repo.clone(),
            requester,
            notifier.clone(),
            extractor,
            &config,
        )));
    }
    drivers
}
