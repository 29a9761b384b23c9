// Relay HTTP client
//
// Wraps `reqwest::Client` and folds every transport outcome into a small
// taxonomy: a JSON payload, a bare acknowledgement, "not modified", or one
// of the three relay errors. Redirects are followed by hand, exactly once.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, LOCATION};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info, trace};
use url::Url;

use super::cache::ResponseCache;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Identity of the site a call is made on behalf of, carried into errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRef {
    pub id: String,
    pub name: String,
}

impl SiteRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Normalized success outcome of a relay call.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// 2xx with a JSON-typed, parseable body.
    Json(Value),
    /// 2xx with an empty or non-JSON body.
    Acknowledged,
    /// 304. Carries no body.
    NotModified,
}

impl Reply {
    /// JSON view of the reply. An acknowledgement reads as
    /// `{"success": true}`; `NotModified` has no body.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Acknowledged => Some(json!({ "success": true })),
            Self::NotModified => None,
        }
    }
}

/// Unnormalized response for callers that need the body as-is.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Outbound HTTP client for site, relay, and directory calls.
///
/// Cheap to clone; clones share the connection pool and the optional
/// response cache.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    cache: Option<Arc<ResponseCache>>,
}

impl RelayClient {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self::with_client(transport.build_client()?))
    }

    /// Use a pre-built client. It must not follow redirects on its own.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http, cache: None }
    }

    /// Cache successful GET JSON replies for `ttl`.
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(Arc::new(ResponseCache::new(ttl)));
        self
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_deref()
    }

    /// Perform a call and normalize the outcome.
    pub async fn call(
        &self,
        site: &SiteRef,
        method: Method,
        url: Url,
        headers: &HeaderMap,
        body: Option<&Value>,
    ) -> Result<Reply, Error> {
        let cacheable = method == Method::GET && self.cache.is_some();
        let key = url.to_string();
        if cacheable {
            if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&key)) {
                trace!(url = %key, "relay cache hit");
                return Ok(Reply::Json(hit));
            }
        }

        let resp = self.send(site, method, url, headers, body).await?;
        let reply = normalize(site, resp).await?;

        if cacheable {
            if let (Some(cache), Reply::Json(value)) = (&self.cache, &reply) {
                cache.insert(key, value.clone());
            }
        }
        Ok(reply)
    }

    /// Perform a call, following at most one redirect, and return the
    /// response untouched. Only transport failures become errors.
    pub async fn call_raw(
        &self,
        site: &SiteRef,
        method: Method,
        url: Url,
        headers: &HeaderMap,
        body: Option<&Value>,
    ) -> Result<RawReply, Error> {
        let resp = self.send(site, method, url, headers, body).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(|e| connection_error(site, &e))?;
        Ok(RawReply {
            status,
            headers,
            body,
        })
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send once; on a redirect status with a `Location`, re-issue the same
    /// request there and return whatever that second hop answers.
    async fn send(
        &self,
        site: &SiteRef,
        method: Method,
        url: Url,
        headers: &HeaderMap,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, Error> {
        let resp = self
            .send_once(site, method.clone(), url.clone(), headers, body)
            .await?;

        if !is_redirect(resp.status()) {
            return Ok(resp);
        }
        let Some(next) = redirect_target(&url, resp.headers()) else {
            return Ok(resp);
        };

        debug!(site = %site.id, from = %url, to = %next, "following redirect");
        self.send_once(site, method, next, headers, body).await
    }

    async fn send_once(
        &self,
        site: &SiteRef,
        method: Method,
        url: Url,
        headers: &HeaderMap,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, Error> {
        debug!(site = %site.id, %method, %url, "relay request");

        let mut builder = self.http.request(method, url).headers(headers.clone());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder.send().await.map_err(|e| connection_error(site, &e))
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn redirect_target(current: &Url, headers: &HeaderMap) -> Option<Url> {
    let location = headers.get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

async fn normalize(site: &SiteRef, resp: reqwest::Response) -> Result<Reply, Error> {
    let status = resp.status();

    if status == StatusCode::NOT_MODIFIED {
        return Ok(Reply::NotModified);
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        info!(site = %site.id, %status, "site requires authentication");
        return Err(Error::AuthRequired {
            site_id: site.id.clone(),
            site_name: site.name.clone(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(request_failed(
            site,
            status.as_u16(),
            format!("HTTP {status}: {}", preview(&body)),
        ));
    }

    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

    let body = resp.bytes().await.map_err(|e| connection_error(site, &e))?;
    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Reply::Acknowledged);
    }

    serde_json::from_slice(&body).map(Reply::Json).map_err(|e| {
        let text = String::from_utf8_lossy(&body);
        request_failed(
            site,
            StatusCode::BAD_GATEWAY.as_u16(),
            format!("invalid JSON from upstream: {e} (body preview: {:?})", preview(&text)),
        )
    })
}

pub(crate) fn request_failed(site: &SiteRef, status: u16, message: String) -> Error {
    Error::RequestFailed {
        message,
        site_id: site.id.clone(),
        site_name: site.name.clone(),
        status,
    }
}

fn connection_error(site: &SiteRef, err: &reqwest::Error) -> Error {
    let reason = if err.is_timeout() {
        "request timed out".to_owned()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    Error::Connection {
        site_id: site.id.clone(),
        site_name: site.name.clone(),
        reason,
    }
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
