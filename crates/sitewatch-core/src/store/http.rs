// ── HTTP snapshot backend ──
//
// `GET {url}` returns the last persisted snapshot; `POST {url}` with the
// full snapshot body replaces it. Calls go through the relay client so
// they share its redirect and status normalization.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;
use sitewatch_api::{RelayClient, Reply, SiteRef};
use url::Url;

use super::backend::SnapshotBackend;
use crate::error::CoreError;
use crate::model::Snapshot;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    relay: RelayClient,
    url: Url,
    headers: HeaderMap,
    site: SiteRef,
}

impl HttpBackend {
    pub fn new(relay: RelayClient, url: Url) -> Self {
        Self {
            site: SiteRef::new(url.host_str().unwrap_or("snapshot-store"), "snapshot store"),
            relay,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Extra headers sent on every call, typically an authorization header.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn persistence(action: &str, err: &sitewatch_api::Error) -> CoreError {
    CoreError::SnapshotPersistence {
        message: format!("{action}: {err}"),
    }
}

#[async_trait]
impl SnapshotBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        let reply = self
            .relay
            .call(&self.site, Method::GET, self.url.clone(), &self.headers, None)
            .await;
        match reply {
            Ok(Reply::Json(serde_json::Value::Null)) => Ok(None),
            Ok(Reply::Json(value)) => Ok(Some(serde_json::from_value(value)?)),
            Ok(Reply::Acknowledged | Reply::NotModified) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(persistence("loading snapshot", &e)),
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        let body = serde_json::to_value(snapshot)?;
        self.relay
            .call(&self.site, Method::POST, self.url.clone(), &self.headers, Some(&body))
            .await
            .map(drop)
            .map_err(|e| persistence("saving snapshot", &e))
    }
}
