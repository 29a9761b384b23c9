// Directory endpoints
//
// The site list comes from the global directory (through the alias) or from
// a local relay alias that serves the same listing.

use reqwest::Method;
use tracing::debug;

use super::FleetClient;
use crate::error::Error;
use crate::models::{SystemRecord, parse_systems};
use crate::relay::{Reply, SiteRef, request_failed};
use crate::route::AddressClass;

impl FleetClient {
    /// List every system visible through `directory`.
    ///
    /// Against the global alias this requests the "system info" path, which
    /// the router rewrites to the directory listing.
    pub async fn list_systems(&self, directory: &str) -> Result<Vec<SystemRecord>, Error> {
        let endpoints = self.router().endpoints();
        let path = if self.router().classify(directory) == AddressClass::GlobalAlias {
            endpoints.system_info.clone()
        } else {
            endpoints.directory_systems.clone()
        };
        let site = SiteRef::new(directory, "directory");

        debug!(directory, "listing systems");
        match self.request(&site, Method::GET, &path, &[], None).await? {
            Reply::Json(value) => {
                parse_systems(value).map_err(|reason| request_failed(&site, 502, reason))
            }
            Reply::Acknowledged | Reply::NotModified => Ok(Vec::new()),
        }
    }
}
