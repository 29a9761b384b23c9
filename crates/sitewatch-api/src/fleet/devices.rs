// Per-site device endpoints

use reqwest::Method;
use tracing::debug;

use super::FleetClient;
use crate::error::Error;
use crate::models::{DeviceRecord, RemoteEvent, parse_devices};
use crate::relay::{Reply, SiteRef, request_failed};

impl FleetClient {
    /// Fetch the device inventory of one site.
    ///
    /// `GET {devices}`; a JSON `null` body means no devices. A 2xx reply
    /// that is empty, not JSON, or a 304 is a failed fetch: it cannot
    /// stand in for an inventory.
    pub async fn list_devices(&self, site: &SiteRef) -> Result<Vec<DeviceRecord>, Error> {
        let path = self.router().endpoints().devices.clone();
        debug!(site = %site.id, "listing devices");
        match self.request(site, Method::GET, &path, &[], None).await? {
            Reply::Json(value) => {
                parse_devices(value).map_err(|reason| request_failed(site, 502, reason))
            }
            Reply::Acknowledged | Reply::NotModified => {
                Err(request_failed(site, 502, "expected a device array".into()))
            }
        }
    }

    /// Post a generic event to one site.
    ///
    /// `POST {events}` with `{timestamp, caption, systemId, systemName}`.
    pub async fn emit_event(&self, site: &SiteRef, event: &RemoteEvent) -> Result<(), Error> {
        let path = self.router().endpoints().events.clone();
        let body = serde_json::to_value(event)
            .map_err(|e| request_failed(site, 500, format!("event serialization failed: {e}")))?;
        debug!(site = %site.id, caption = %event.caption, "emitting event");
        self.request(site, Method::POST, &path, &[], Some(&body))
            .await
            .map(drop)
    }
}
