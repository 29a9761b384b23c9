// ── Inventory aggregator ──
//
// Fans one inventory fetch out per site, bounded by a concurrency limit
// and a per-site timeout, and gathers every outcome. A failing site
// becomes a `Failed` entry with no devices; it never aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use futures_util::stream;
use sitewatch_api::FleetClient;
use tracing::{debug, info, warn};

use crate::model::{Device, Site, SitePoll, Snapshot};

/// Fetches one site's device inventory.
#[async_trait]
pub trait DeviceFetcher: Send + Sync {
    async fn fetch_devices(&self, site: &Site) -> Result<Vec<Device>, sitewatch_api::Error>;
}

#[async_trait]
impl DeviceFetcher for FleetClient {
    async fn fetch_devices(&self, site: &Site) -> Result<Vec<Device>, sitewatch_api::Error> {
        let records = self.list_devices(&site.site_ref()).await?;
        Ok(records
            .into_iter()
            .map(|r| Device::from_record(r, &site.id))
            .collect())
    }
}

#[derive(Clone)]
pub struct Aggregator {
    fetcher: Arc<dyn DeviceFetcher>,
    timeout: Duration,
    concurrency: usize,
}

impl Aggregator {
    /// `concurrency == 0` polls every site at once.
    pub fn new(fetcher: Arc<dyn DeviceFetcher>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            fetcher,
            timeout,
            concurrency,
        }
    }

    /// Poll every site not reported offline and merge the results.
    ///
    /// Offline sites contribute no entry. Result order is completion
    /// order and carries no meaning.
    pub async fn poll_all(&self, sites: &[Site]) -> Snapshot {
        let targets: Vec<&Site> = sites.iter().filter(|s| !s.is_offline()).collect();
        let skipped = sites.len() - targets.len();
        if skipped > 0 {
            debug!(skipped, "skipping offline sites");
        }

        let limit = match self.concurrency {
            0 => targets.len().max(1),
            n => n,
        };

        let futures: Vec<_> = targets.into_iter().map(|site| self.poll_site(site)).collect();
        let polls: Vec<SitePoll> = stream::iter(futures)
            .buffer_unordered(limit)
            .collect()
            .await;

        Snapshot::from_polls(Utc::now(), polls)
    }

    async fn poll_site(&self, site: &Site) -> SitePoll {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch_devices(site)).await {
            Ok(Ok(devices)) => {
                debug!(site = %site.id, count = devices.len(), "site polled");
                SitePoll::success(site.id.clone(), site.name.clone(), devices)
            }
            Ok(Err(e)) if e.is_auth_required() => {
                info!(site = %site.id, "site requires authentication, marking poll failed");
                SitePoll::failed(site.id.clone(), site.name.clone())
            }
            Ok(Err(e)) => {
                warn!(site = %site.id, error = %e, "site poll failed");
                SitePoll::failed(site.id.clone(), site.name.clone())
            }
            Err(_) => {
                warn!(site = %site.id, timeout = ?self.timeout, "site poll timed out");
                SitePoll::failed(site.id.clone(), site.name.clone())
            }
        }
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("timeout", &self.timeout)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
