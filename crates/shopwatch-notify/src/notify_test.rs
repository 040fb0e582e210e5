use std::fs;

use serde_json::json;
use shopwatch_core::Size;
use shopwatch_net::{ProxyPool, UserAgentPool};
use shopwatch_store::DocStore;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

struct Fixture {
    _dir: TempDir,
    notifier: Notifier,
}

async fn fixture(endpoint: Option<String>, max_retries: u32) -> Fixture {
    let dir = TempDir::new().unwrap();
    let proxies_path = dir.path().join("Proxies.txt");
    let agents_path = dir.path().join("UserAgents.txt");
    fs::write(&proxies_path, "").unwrap();
    fs::write(&agents_path, "test-agent\n").unwrap();

    let session = Arc::new(
        Session::new(
            ProxyPool::load(proxies_path).unwrap(),
            UserAgentPool::load(agents_path).unwrap(),
        )
        .unwrap(),
    );

    let store = DocStore::open_in_memory().await.unwrap();
    if let Some(endpoint) = endpoint {
        store
            .insert(
                "Messengers",
                &json!({"apiType": "webhook", "apiEndpoint": endpoint}),
            )
            .await
            .unwrap();
        store
            .insert(
                "Messengers",
                &json!({
                    "configName": "product-msg-config",
                    "user": "424242",
                    "token": "s3cret-token",
                    "timeout": 5,
                    "maxRetries": max_retries,
                    "useRandomProxy": false,
                    "username": "shopwatch",
                }),
            )
            .await
            .unwrap();
    }

    Fixture {
        _dir: dir,
        notifier: Notifier::new(session, MessengersRepo::new(store)),
    }
}

fn restocked_product() -> (Product, Shop) {
    let mut shop = Shop::new("https://www.solebox.com");
    shop.name = "Solebox".to_owned();
    let mut product = Product::from_url("https://www.solebox.com/p/one.htm");
    product.name = "Runner XT".to_owned();
    product.base_price = Some(120.0);
    product.currency = Some("EUR".to_owned());
    product.sizes = vec![Size::observed("42", true), Size::observed("43", false)];
    (product, shop)
}

#[tokio::test]
async fn send_product_posts_to_endpoint_user_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/424242/s3cret-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = fixture(Some(format!("{}/api/webhooks/", server.uri())), 0).await;
    let (product, shop) = restocked_product();
    fixture.notifier.send_product(&product, &shop).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["username"], "shopwatch");
    assert_eq!(body["embeds"][0]["title"], "Runner XT");
    assert_eq!(body["embeds"][0]["description"], "Solebox");
    assert_eq!(body["embeds"][0]["fields"][0]["value"], "120.00 EUR");
    assert_eq!(body["embeds"][0]["fields"][1]["value"], "42");
}

#[tokio::test]
async fn delivery_failure_is_swallowed_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    // max_retries=1 → two attempts, then the message is dropped silently.
    let fixture = fixture(Some(server.uri()), 1).await;
    let (product, shop) = restocked_product();
    fixture.notifier.send_product(&product, &shop).await;
}

#[tokio::test]
async fn missing_messenger_config_is_swallowed() {
    let fixture = fixture(None, 0).await;
    let (product, shop) = restocked_product();
    // No endpoint or channel records exist; the send must not panic.
    fixture.notifier.send_product(&product, &shop).await;
    fixture.notifier.send_log("log line").await;
    fixture.notifier.send_error("error line").await;
}
