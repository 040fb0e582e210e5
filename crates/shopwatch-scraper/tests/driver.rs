//! End-to-end driver ticks against mock shop pages, an in-memory store
//! and a mock webhook endpoint.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use scraper::{Html, Selector};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopwatch_core::{Product, Shop, Size};
use shopwatch_net::{ProxyPool, Requester, Session, UserAgentPool};
use shopwatch_notify::Notifier;
use shopwatch_scraper::{apply_size_observation, ExtractError, Extractor, ShopDriver};
use shopwatch_store::{DocStore, MessengersRepo, ScraperConfig, ShopRepo};

/// Minimal extractor for the mock storefront: name from `<h1>`, sizes from
/// `li.size` elements carrying a `data-stock` attribute.
struct TestExtractor {
    url: String,
}

impl Extractor for TestExtractor {
    fn url(&self) -> &str {
        &self.url
    }

    fn set_product_name(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<bool, ExtractError> {
        let sel = Selector::parse("h1").expect("valid selector");
        let name = doc
            .select(&sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_owned())
            .filter(|n| !n.is_empty())
            .ok_or(ExtractError::Missing("h1"))?;
        if product.name == name {
            return Ok(false);
        }
        product.name = name;
        Ok(true)
    }

    fn set_product_sizes(
        &self,
        doc: &Html,
        product: &mut Product,
    ) -> Result<bool, ExtractError> {
        let sel = Selector::parse("li.size").expect("valid selector");
        let mut changed = false;
        for li in doc.select(&sel) {
            let size = li.text().collect::<String>().trim().to_owned();
            let in_stock = li.value().attr("data-stock") == Some("in");
            changed |= apply_size_observation(product, &size, in_stock);
        }
        Ok(changed)
    }

    fn set_product_price(&self, _doc: &Html, _product: &mut Product) -> Result<bool, ExtractError> {
        Ok(false)
    }

    fn set_product_thumb_url(
        &self,
        _doc: &Html,
        _product: &mut Product,
    ) -> Result<bool, ExtractError> {
        Ok(false)
    }
}

struct Fixture {
    _dir: TempDir,
    store: DocStore,
    repo: ShopRepo,
    session: Arc<Session>,
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let proxies = dir.path().join("Proxies.txt");
    let agents = dir.path().join("UserAgents.txt");
    fs::write(&proxies, "").unwrap();
    fs::write(&agents, "test-agent\n").unwrap();

    let session = Arc::new(
        Session::new(
            ProxyPool::load(proxies).unwrap(),
            UserAgentPool::load(agents).unwrap(),
        )
        .unwrap(),
    );
    let store = DocStore::open_in_memory().await.unwrap();
    let repo = ShopRepo::new(store.clone());
    Fixture {
        _dir: dir,
        store,
        repo,
        session,
    }
}

fn test_config() -> ScraperConfig {
    ScraperConfig {
        iter_sleep_from_scnds: 0.1,
        iter_sleep_to_scnds: 0.2,
        iter_sleep_steps: 0.1,
        fetch_timeout_scnds: 5,
        fetch_max_retries: 0,
        fetch_use_random_proxy: false,
    }
}

async fn seed_messengers(store: &DocStore, webhook_uri: &str) {
    store
        .insert(
            "Messengers",
            &json!({"apiType": "webhook", "apiEndpoint": format!("{webhook_uri}/api/webhooks")}),
        )
        .await
        .unwrap();
    store
        .insert(
            "Messengers",
            &json!({
                "configName": "product-msg-config",
                "user": "111",
                "token": "abc",
                "timeout": 5,
                "maxRetries": 0,
                "useRandomProxy": false,
                "username": "shopwatch",
            }),
        )
        .await
        .unwrap();
}

fn shop_with_one_product(shop_url: &str, size: Size) -> Shop {
    let mut product = Product::from_url(format!("{shop_url}/p1"));
    product.sizes = vec![size];
    let mut shop = Shop::new(shop_url);
    shop.add_product(product);
    shop
}

async fn mount_pages(server: &MockServer, product_page: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Mock Kicks</title></head></html>"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page.to_owned()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn restock_commits_once_and_notifies_once() {
    let pages = MockServer::start().await;
    let webhook = MockServer::start().await;

    mount_pages(
        &pages,
        "<html><h1>Runner XT</h1><ul><li class=\"size\" data-stock=\"in\">42</li></ul></html>",
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/111/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&webhook)
        .await;

    let fixture = fixture().await;
    seed_messengers(&fixture.store, &webhook.uri()).await;

    let shop = shop_with_one_product(&pages.uri(), Size::observed("42", false));
    fixture.repo.set_all(&[shop.clone()]).await.unwrap();

    let notifier = Arc::new(Notifier::new(
        fixture.session.clone(),
        MessengersRepo::new(fixture.store.clone()),
    ));
    let driver = ShopDriver::new(
        shop.clone(),
        fixture.repo.clone(),
        Requester::new(fixture.session.clone()),
        Some(notifier),
        Box::new(TestExtractor { url: pages.uri() }),
        &test_config(),
    );

    driver.run().await;

    // The restock is persisted, along with name and scan stamps.
    let stored = fixture.repo.find_by_uid(shop.uid).await.unwrap().unwrap();
    assert_eq!(stored.name, "Mock Kicks");
    let product = &stored.products[0];
    assert_eq!(product.name, "Runner XT");
    assert_eq!(product.find_size("42").unwrap().is_in_stock, Some(true));
    assert!(product.last_scan_stamp > 0.0);
    assert_eq!(driver.fail_count(), 0);

    // Exactly one product notification went out (checked by expect(1)).
    let posts = webhook.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&posts.last().unwrap().body).unwrap();
    assert_eq!(body["embeds"][0]["title"], "Runner XT");
    assert_eq!(body["embeds"][0]["fields"][0]["name"], "Sizes");
    assert_eq!(body["embeds"][0]["fields"][0]["value"], "42");

    // A second identical tick observes no change and stays silent.
    driver.run().await;
    assert_eq!(webhook.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn new_size_appearing_notifies_with_full_size_list() {
    let pages = MockServer::start().await;
    let webhook = MockServer::start().await;

    mount_pages(
        &pages,
        "<html><h1>Runner XT</h1><ul>\
         <li class=\"size\" data-stock=\"in\">40</li>\
         <li class=\"size\" data-stock=\"in\">41</li>\
         <li class=\"size\" data-stock=\"in\">42</li>\
         </ul></html>",
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/111/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&webhook)
        .await;

    let fixture = fixture().await;
    seed_messengers(&fixture.store, &webhook.uri()).await;

    let mut shop = shop_with_one_product(&pages.uri(), Size::observed("40", true));
    shop.products[0].name = "Runner XT".to_owned();
    shop.products[0].sizes.push(Size::observed("41", true));
    shop.name = "Mock Kicks".to_owned();
    fixture.repo.set_all(&[shop.clone()]).await.unwrap();

    let notifier = Arc::new(Notifier::new(
        fixture.session.clone(),
        MessengersRepo::new(fixture.store.clone()),
    ));
    let driver = ShopDriver::new(
        shop.clone(),
        fixture.repo.clone(),
        Requester::new(fixture.session.clone()),
        Some(notifier),
        Box::new(TestExtractor { url: pages.uri() }),
        &test_config(),
    );

    driver.run().await;

    let stored = fixture.repo.find_by_uid(shop.uid).await.unwrap().unwrap();
    let sizes: Vec<&str> = stored.products[0]
        .sizes
        .iter()
        .filter_map(|s| s.size_eu.as_deref())
        .collect();
    assert_eq!(sizes, ["40", "41", "42"]);

    let posts = webhook.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&posts[0].body).unwrap();
    assert_eq!(body["embeds"][0]["fields"][0]["value"], "40\n41\n42");
}

#[tokio::test]
async fn fetch_failures_count_and_do_not_abort_the_tick() {
    let pages = MockServer::start().await;
    // Shop page works, the product page always fails.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Mock Kicks</title></head></html>"),
        )
        .mount(&pages)
        .await;
    Mock::given(method("GET"))
        .and(path("/p1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&pages)
        .await;

    let fixture = fixture().await;
    let shop = shop_with_one_product(&pages.uri(), Size::observed("42", false));
    fixture.repo.set_all(&[shop.clone()]).await.unwrap();

    let driver = ShopDriver::new(
        shop.clone(),
        fixture.repo.clone(),
        Requester::new(fixture.session.clone()),
        None,
        Box::new(TestExtractor { url: pages.uri() }),
        &test_config(),
    );

    driver.run().await;

    // One failed product fetch; the shop page still went through.
    assert_eq!(driver.fail_count(), 1);
    let stored = fixture.repo.find_by_uid(shop.uid).await.unwrap().unwrap();
    assert_eq!(stored.name, "Mock Kicks");
    // The product kept its last-known state.
    assert_eq!(
        stored.products[0].find_size("42").unwrap().is_in_stock,
        Some(false)
    );
}

#[tokio::test]
async fn hook_failures_count_but_other_hooks_still_apply() {
    let pages = MockServer::start().await;
    // No <h1>: the name hook fails, the sizes hook succeeds.
    mount_pages(
        &pages,
        "<html><ul><li class=\"size\" data-stock=\"in\">42</li></ul></html>",
    )
    .await;

    let fixture = fixture().await;
    let shop = shop_with_one_product(&pages.uri(), Size::observed("42", false));
    fixture.repo.set_all(&[shop.clone()]).await.unwrap();

    let driver = ShopDriver::new(
        shop.clone(),
        fixture.repo.clone(),
        Requester::new(fixture.session.clone()),
        None,
        Box::new(TestExtractor { url: pages.uri() }),
        &test_config(),
    );

    driver.run().await;

    assert_eq!(driver.fail_count(), 1);
    let stored = fixture.repo.find_by_uid(shop.uid).await.unwrap().unwrap();
    assert_eq!(
        stored.products[0].find_size("42").unwrap().is_in_stock,
        Some(true)
    );
}

#[tokio::test]
async fn stop_exits_the_loop_within_one_sleep_interval() {
    let pages = MockServer::start().await;
    mount_pages(&pages, "<html><h1>Runner XT</h1></html>").await;

    let fixture = fixture().await;
    let shop = shop_with_one_product(&pages.uri(), Size::observed("42", true));
    fixture.repo.set_all(&[shop.clone()]).await.unwrap();

    let driver = Arc::new(ShopDriver::new(
        shop,
        fixture.repo.clone(),
        Requester::new(fixture.session.clone()),
        None,
        Box::new(TestExtractor { url: pages.uri() }),
        &test_config(),
    ));

    let looper = tokio::spawn({
        let driver = Arc::clone(&driver);
        async move { driver.loop_run().await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    driver.stop();

    tokio::time::timeout(Duration::from_secs(5), looper)
        .await
        .expect("loop did not exit after stop()")
        .unwrap();
}
