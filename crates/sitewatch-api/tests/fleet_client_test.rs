#![allow(clippy::unwrap_used)]
// Integration tests for `FleetClient` using wiremock as the directory host.

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitewatch_api::{
    AddressClass, CredentialKind, CredentialStore, Error, FleetClient, RelayClient, RemoteEvent,
    Router, RoutingConfig, SiteRef, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, FleetClient) {
    let server = MockServer::start().await;
    let routing = RoutingConfig::new(Url::parse(&server.uri()).unwrap());
    let credentials = Arc::new(CredentialStore::new());
    credentials.set_directory_bearer(Some(SecretString::from("cloud-token".to_owned())));
    let relay = RelayClient::new(&TransportConfig::default()).unwrap();
    (server, FleetClient::new(Router::new(routing), credentials, relay))
}

// ── Directory ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_systems_through_global_alias() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/cdb/systems"))
        .and(header("authorization", "Bearer cloud-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "systems": [
                {"id": "s1", "name": "HQ", "stateOfHealth": "online", "accessRole": "owner"},
                {"id": "s2", "name": "Depot", "stateOfHealth": "offline", "accessRole": "viewer"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let systems = client.list_systems("{ALL}").await.unwrap();

    assert_eq!(systems.len(), 2);
    assert_eq!(systems[1].state_of_health.as_deref(), Some("offline"));
}

#[tokio::test]
async fn test_list_systems_rejects_unexpected_shape() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("surprise")))
        .mount(&server)
        .await;

    match client.list_systems("all").await {
        Err(Error::RequestFailed { status: 502, .. }) => {}
        other => panic!("expected RequestFailed(502), got: {other:?}"),
    }
}

#[tokio::test]
async fn test_directory_auth_failure_surfaces() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list_systems("all").await.unwrap_err();
    assert!(err.is_auth_required());
}

// ── Devices and events ──────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_parses_inventory() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v3/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "d1", "name": "Lobby", "status": "Online"},
            {"name": "missing id"}
        ])))
        .mount(&server)
        .await;

    let devices = client
        .list_devices(&SiteRef::new("all", "Directory"))
        .await
        .unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].status, "Online");
}

#[tokio::test]
async fn test_list_devices_null_is_empty() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .mount(&server)
        .await;

    let devices = client
        .list_devices(&SiteRef::new("all", "Directory"))
        .await
        .unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_list_devices_rejects_html_page() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v3/devices"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>login</html>"),
        )
        .mount(&server)
        .await;

    let err = client
        .list_devices(&SiteRef::new("all", "Directory"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RequestFailed { status: 502, .. }), "{err:?}");
}

#[tokio::test]
async fn test_list_devices_rejects_empty_and_not_modified() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v3/devices"))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v3/devices"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let site = SiteRef::new("all", "Directory");
    for _ in 0..2 {
        let err = client.list_devices(&site).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
    }
}

#[tokio::test]
async fn test_emit_event_posts_wire_shape() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/rest/v3/events/generic"))
        .and(body_partial_json(json!({
            "caption": "Camera Lobby is online",
            "systemId": "all",
            "systemName": "Directory"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let event = RemoteEvent {
        timestamp: Utc::now(),
        caption: "Camera Lobby is online".into(),
        system_id: "all".into(),
        system_name: "Directory".into(),
    };
    client
        .emit_event(&SiteRef::new("all", "Directory"), &event)
        .await
        .unwrap();
}

// ── Planning ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_plan_prefers_local_session_on_relay() {
    let (_server, client) = setup().await;
    client
        .credentials()
        .set_session("site-9", SecretString::from("vms-session".to_owned()));

    let plan = client.plan("site-9", "/rest/v3/devices", &[]).unwrap();
    assert_eq!(plan.route.class, AddressClass::RelayIdentifier);
    assert_eq!(plan.auth.kind, CredentialKind::LocalSession);
    assert!(plan.auth.secondary_bearer);
    assert_eq!(
        plan.route.url.as_str(),
        "https://site-9.relay.sitewatch.dev/rest/v3/devices"
    );
}
