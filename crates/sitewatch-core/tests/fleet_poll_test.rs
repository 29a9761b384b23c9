#![allow(clippy::unwrap_used)]
// Aggregator polls over a real `FleetClient` with wiremock as the site host.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitewatch_api::{CredentialStore, FleetClient, RelayClient, Router, RoutingConfig, TransportConfig};
use sitewatch_core::{AccessRole, Aggregator, HealthState, PollStatus, Site};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Aggregator) {
    let server = MockServer::start().await;
    let routing = RoutingConfig::new(Url::parse(&server.uri()).unwrap());
    let relay = RelayClient::new(&TransportConfig::default()).unwrap();
    let fleet = FleetClient::new(Router::new(routing), Arc::new(CredentialStore::new()), relay);
    let agg = Aggregator::new(Arc::new(fleet), Duration::from_secs(5), 4);
    (server, agg)
}

/// The global alias routes to the mock server.
fn directory_site() -> Site {
    Site {
        id: "all".into(),
        name: "Directory".into(),
        health: HealthState::Online,
        role: AccessRole::Owner,
    }
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_page_marks_site_failed() {
    let (server, agg) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v3/devices"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html>login</html>"),
        )
        .mount(&server)
        .await;

    let snap = agg.poll_all(&[directory_site()]).await;

    assert_eq!(snap.successful_sites, 0);
    let entry = snap.site("all").unwrap();
    assert_eq!(entry.poll_status, PollStatus::Failed);
    assert_eq!(entry.device_count, 0);
}

#[tokio::test]
async fn test_device_array_marks_site_successful() {
    let (server, agg) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v3/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "d1", "name": "Lobby", "status": "Online"},
            {"id": "d2", "name": "Dock", "status": "Offline"}
        ])))
        .mount(&server)
        .await;

    let snap = agg.poll_all(&[directory_site()]).await;

    assert_eq!(snap.successful_sites, 1);
    assert_eq!(snap.total_devices, 2);
    assert_eq!(snap.site("all").unwrap().poll_status, PollStatus::Success);
}
