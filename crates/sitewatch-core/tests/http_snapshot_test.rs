#![allow(clippy::unwrap_used)]
// HTTP snapshot backend and monitor persistence against a wiremock store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitewatch_api::{RelayClient, TransportConfig};
use sitewatch_core::{
    AccessRole, CoreError, Device, DeviceFetcher, HealthState, HttpBackend, Monitor, MonitorConfig,
    MonitorParts, Site, SitePoll, SiteSource, Snapshot, SnapshotBackend, TracingNotifier,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HttpBackend) {
    let server = MockServer::start().await;
    let relay = RelayClient::new(&TransportConfig::default()).unwrap();
    let url = Url::parse(&format!("{}/state/snapshot", server.uri())).unwrap();
    (server, HttpBackend::new(relay, url))
}

fn snapshot() -> Snapshot {
    Snapshot::from_polls(
        Utc::now(),
        vec![SitePoll::success(
            "s1".into(),
            "HQ".into(),
            vec![Device {
                id: "d1".into(),
                name: "Lobby".into(),
                status: "Online".into(),
                site_id: "s1".into(),
            }],
        )],
    )
}

// ── Backend ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_missing_snapshot_is_first_run() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/state/snapshot"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(backend.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_load_null_body_is_first_run() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/state/snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .mount(&server)
        .await;

    assert!(backend.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_load_returns_persisted_snapshot() {
    let (server, backend) = setup().await;
    let snap = snapshot();
    Mock::given(method("GET"))
        .and(path("/state/snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&snap))
        .mount(&server)
        .await;

    assert_eq!(backend.load().await.unwrap(), Some(snap));
}

#[tokio::test]
async fn test_load_server_error_is_persistence_error() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = backend.load().await.unwrap_err();
    assert!(matches!(err, CoreError::SnapshotPersistence { .. }));
}

#[tokio::test]
async fn test_save_posts_full_snapshot() {
    let (server, backend) = setup().await;
    let backend = backend.with_headers({
        let mut h = reqwest::header::HeaderMap::new();
        h.insert("authorization", "Bearer store-token".parse().unwrap());
        h
    });
    Mock::given(method("POST"))
        .and(path("/state/snapshot"))
        .and(header("authorization", "Bearer store-token"))
        .and(body_partial_json(json!({
            "totalSites": 1,
            "successfulSites": 1,
            "totalDevices": 1,
            "sites": [{"siteId": "s1", "pollStatus": "success"}]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend.save(&snapshot()).await.unwrap();
}

// ── Monitor persistence ─────────────────────────────────────────────

struct OneSite;

#[async_trait]
impl SiteSource for OneSite {
    async fn list_sites(&self, _directory: &str) -> Result<Vec<Site>, sitewatch_api::Error> {
        Ok(vec![Site {
            id: "s1".into(),
            name: "HQ".into(),
            health: HealthState::Online,
            role: AccessRole::Owner,
        }])
    }
}

struct SteadyDevices;

#[async_trait]
impl DeviceFetcher for SteadyDevices {
    async fn fetch_devices(&self, site: &Site) -> Result<Vec<Device>, sitewatch_api::Error> {
        Ok(vec![Device {
            id: "d1".into(),
            name: "Lobby".into(),
            status: "Online".into(),
            site_id: site.id.clone(),
        }])
    }
}

struct NoEvents;

#[async_trait]
impl sitewatch_core::EventSink for NoEvents {
    async fn emit(
        &self,
        _site: &sitewatch_api::SiteRef,
        _event: &sitewatch_api::RemoteEvent,
    ) -> Result<(), sitewatch_api::Error> {
        Ok(())
    }
}

#[tokio::test]
async fn test_monitor_writes_unchanged_snapshot_once() {
    let (server, backend) = setup().await;
    Mock::given(method("GET"))
        .and(path("/state/snapshot"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/state/snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let monitor = Monitor::new(
        MonitorConfig::default(),
        MonitorParts {
            sites: Arc::new(OneSite),
            fetcher: Arc::new(SteadyDevices),
            events: Arc::new(NoEvents),
            notifier: Arc::new(TracingNotifier),
            backend: Arc::new(backend),
        },
    );

    assert!(monitor.bootstrap().await.is_none());
    for _ in 0..3 {
        monitor.run_cycle().await;
    }

    let current = monitor.current_snapshot().unwrap();
    assert_eq!(current.total_devices, 1);
}
