//! Behavioural tests for the retrying request layer against a local mock
//! server. Proxy-less policies are used except where a proxy is the point
//! of the test.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopwatch_net::{NetError, Params, ProxyPool, RequestPolicy, Requester, Session, UserAgentPool};

struct Fixture {
    _dir: TempDir,
    session: Arc<Session>,
}

fn session_with(proxies: &str, agents: &str) -> Fixture {
    let dir = TempDir::new().unwrap();
    let proxies_path = dir.path().join("Proxies.txt");
    let agents_path = dir.path().join("UserAgents.txt");
    fs::write(&proxies_path, proxies).unwrap();
    fs::write(&agents_path, agents).unwrap();

    let session = Session::new(
        ProxyPool::load(proxies_path).unwrap(),
        UserAgentPool::load(agents_path).unwrap(),
    )
    .unwrap();
    Fixture {
        _dir: dir,
        session: Arc::new(session),
    }
}

fn direct_policy(max_retries: u32) -> RequestPolicy {
    RequestPolicy {
        timeout_secs: 5,
        max_retries,
        use_random_proxy: false,
    }
}

#[tokio::test]
async fn fetch_returns_text_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = session_with("", "test-agent\n");
    let requester = Requester::with_policy(fixture.session.clone(), direct_policy(0));

    let response = requester
        .fetch(&Params::get(format!("{}/product", server.uri())))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.text, "<html>ok</html>");
}

#[tokio::test]
async fn fetch_sends_pool_user_agent_overriding_caller_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", "pool-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = session_with("", "pool-agent\n");
    let requester = Requester::with_policy(fixture.session.clone(), direct_policy(0));

    let params =
        Params::get(format!("{}/ua", server.uri())).with_header("User-Agent", "caller-agent");
    let response = requester.fetch(&params).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn fetch_retries_bad_status_until_budget_is_spent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/always-503"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let fixture = session_with("", "test-agent\n");
    // max_retries=1 → exactly 2 attempts.
    let requester = Requester::with_policy(fixture.session.clone(), direct_policy(1));

    let result = requester
        .fetch(&Params::get(format!("{}/always-503", server.uri())))
        .await;
    match result {
        Err(NetError::RetriesExhausted { tries, .. }) => assert_eq!(tries, 2),
        other => panic!("expected RetriesExhausted, got: {other:?}"),
    }
}

#[tokio::test]
async fn retry_budget_zero_means_exactly_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/always-503"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = session_with("", "test-agent\n");
    let requester = Requester::with_policy(fixture.session.clone(), direct_policy(0));

    let result = requester
        .fetch(&Params::get(format!("{}/always-503", server.uri())))
        .await;
    assert!(matches!(
        result,
        Err(NetError::RetriesExhausted { tries: 1, .. })
    ));
}

#[tokio::test]
async fn fetch_recovers_when_a_retry_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = session_with("", "test-agent\n");
    let requester = Requester::with_policy(fixture.session.clone(), direct_policy(2));

    let response = requester
        .fetch(&Params::get(format!("{}/flaky", server.uri())))
        .await
        .unwrap();
    assert_eq!(response.text, "recovered");
}

#[tokio::test]
async fn fetch_with_empty_user_agent_pool_fails_fast() {
    let fixture = session_with("", "");
    let requester = Requester::with_policy(fixture.session.clone(), direct_policy(3));

    let result = requester.fetch(&Params::get("http://127.0.0.1:9/x")).await;
    assert!(matches!(result, Err(NetError::EmptyUserAgentPool)));
}

#[tokio::test]
async fn fetch_with_empty_proxy_pool_fails_fast_when_proxy_required() {
    let fixture = session_with("", "test-agent\n");
    let policy = RequestPolicy {
        timeout_secs: 5,
        max_retries: 3,
        use_random_proxy: true,
    };
    let requester = Requester::with_policy(fixture.session.clone(), policy);

    let result = requester.fetch(&Params::get("http://127.0.0.1:9/x")).await;
    assert!(matches!(result, Err(NetError::EmptyProxyPool)));
}

#[tokio::test]
async fn refusing_proxy_exhausts_budget_with_quarter_second_spacing() {
    // Port 9 (discard) refuses connections on loopback.
    let fixture = session_with("127.0.0.1:9\n", "test-agent\n");
    let policy = RequestPolicy {
        timeout_secs: 2,
        max_retries: 2,
        use_random_proxy: true,
    };
    let requester = Requester::with_policy(fixture.session.clone(), policy);

    let started = std::time::Instant::now();
    let result = requester
        .fetch(&Params::get("http://example.invalid/x"))
        .await;
    assert!(matches!(
        result,
        Err(NetError::RetriesExhausted { tries: 3, .. })
    ));
    // Three connect failures with two 0.25s pauses in between.
    assert!(started.elapsed() >= std::time::Duration::from_millis(500));
}

#[tokio::test]
async fn post_requires_headers_and_body() {
    let fixture = session_with("", "test-agent\n");
    let requester = Requester::with_policy(fixture.session.clone(), direct_policy(0));

    let no_headers = Params::post("http://127.0.0.1:9/x", serde_json::json!({"a": 1}));
    assert!(matches!(
        requester.post(&no_headers).await,
        Err(NetError::MissingPostField("headers"))
    ));

    let no_body = Params::get("http://127.0.0.1:9/x").with_header("Content-Type", "application/json");
    assert!(matches!(
        requester.post(&no_body).await,
        Err(NetError::MissingPostField("data"))
    ));
}

#[tokio::test]
async fn post_accepts_204_as_success() {
    let server = MockServer::start().await;
    let payload = serde_json::json!({"content": "hello"});
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = session_with("", "test-agent\n");
    let requester = Requester::with_policy(fixture.session.clone(), direct_policy(0));

    let params = Params::post(format!("{}/hook", server.uri()), payload)
        .with_header("Content-Type", "application/json");
    let response = requester.post(&params).await.unwrap();
    assert_eq!(response.status, 204);
    assert!(response.text.is_empty());
}
