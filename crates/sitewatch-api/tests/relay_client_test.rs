#![allow(clippy::unwrap_used)]
// Integration tests for `RelayClient` outcome normalization using wiremock.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitewatch_api::{Error, RelayClient, Reply, SiteRef, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RelayClient) {
    let server = MockServer::start().await;
    let client = RelayClient::new(&TransportConfig::default()).unwrap();
    (server, client)
}

fn site() -> SiteRef {
    SiteRef::new("site-a", "Warehouse")
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{p}", server.uri())).unwrap()
}

async fn get(client: &RelayClient, target: Url) -> Result<Reply, Error> {
    client
        .call(&site(), Method::GET, target, &HeaderMap::new(), None)
        .await
}

// ── Redirects ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_redirect_follows_exactly_one_hop() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/b"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/c"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reached": "c"})))
        .expect(0)
        .mount(&server)
        .await;

    let result = get(&client, url(&server, "/a")).await;

    match result {
        Err(Error::RequestFailed { status, .. }) => assert_eq!(status, 302),
        other => panic!("expected RequestFailed(302), got: {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_redirect_reissues_method_headers_and_body() {
    let (server, client) = setup().await;
    let payload = json!({"caption": "hello"});

    Mock::given(method("POST"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(307).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/new"))
        .and(header("authorization", "Bearer t0k"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert("authorization", "Bearer t0k".parse().unwrap());
    let reply = client
        .call(&site(), Method::POST, url(&server, "/old"), &headers, Some(&payload))
        .await
        .unwrap();

    assert_eq!(reply, Reply::Json(json!({"ok": true})));
}

// ── Status normalization ────────────────────────────────────────────

#[tokio::test]
async fn test_not_modified_passes_through() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    assert_eq!(get(&client, url(&server, "/x")).await.unwrap(), Reply::NotModified);
}

#[tokio::test]
async fn test_unauthorized_and_forbidden_require_auth() {
    for status in [401, 403] {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        match get(&client, url(&server, "/x")).await {
            Err(Error::AuthRequired { site_id, site_name }) => {
                assert_eq!(site_id, "site-a");
                assert_eq!(site_name, "Warehouse");
            }
            other => panic!("expected AuthRequired for {status}, got: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_server_error_is_request_failed() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal kaboom"))
        .mount(&server)
        .await;

    match get(&client, url(&server, "/x")).await {
        Err(Error::RequestFailed {
            status, message, ..
        }) => {
            assert_eq!(status, 500);
            assert!(message.contains("kaboom"), "message: {message}");
        }
        other => panic!("expected RequestFailed, got: {other:?}"),
    }
}

// ── Body normalization ──────────────────────────────────────────────

#[tokio::test]
async fn test_malformed_json_is_bad_gateway() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
        .mount(&server)
        .await;

    match get(&client, url(&server, "/x")).await {
        Err(err @ Error::RequestFailed { status: 502, .. }) => assert!(err.is_transient()),
        other => panic!("expected RequestFailed(502), got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_acknowledged() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let reply = get(&client, url(&server, "/x")).await.unwrap();
    assert_eq!(reply, Reply::Acknowledged);
    assert_eq!(reply.into_json(), Some(json!({"success": true})));
}

#[tokio::test]
async fn test_empty_json_body_is_acknowledged() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204).insert_header("content-type", "application/json"))
        .mount(&server)
        .await;

    let reply = client
        .call(&site(), Method::POST, url(&server, "/x"), &HeaderMap::new(), None)
        .await
        .unwrap();
    assert_eq!(reply, Reply::Acknowledged);
}

#[tokio::test]
async fn test_raw_call_returns_body_untouched() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("raw bytes"))
        .mount(&server)
        .await;

    let raw = client
        .call_raw(&site(), Method::GET, url(&server, "/x"), &HeaderMap::new(), None)
        .await
        .unwrap();
    assert_eq!(raw.status.as_u16(), 500);
    assert_eq!(&raw.body[..], b"raw bytes");
}

// ── Transport failures ──────────────────────────────────────────────

#[tokio::test]
async fn test_connection_refused_is_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = RelayClient::new(&TransportConfig::default()).unwrap();
    let target = Url::parse(&format!("http://127.0.0.1:{port}/x")).unwrap();

    match get(&client, target).await {
        Err(Error::Connection { site_id, .. }) => assert_eq!(site_id, "site-a"),
        other => panic!("expected Connection error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = TransportConfig::default().with_timeout(Duration::from_millis(50));
    let client = RelayClient::new(&transport).unwrap();

    match get(&client, url(&server, "/slow")).await {
        Err(Error::Connection { reason, .. }) => assert!(reason.contains("timed out"), "{reason}"),
        other => panic!("expected Connection error, got: {other:?}"),
    }
}

// ── Cache ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cache_serves_repeat_gets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "d1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = RelayClient::new(&TransportConfig::default())
        .unwrap()
        .with_cache(Duration::from_secs(60));

    let first = get(&client, url(&server, "/devices")).await.unwrap();
    let second = get(&client, url(&server, "/devices")).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(client.cache().map(|c| c.len()), Some(1));
}
