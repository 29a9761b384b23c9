// ── Site directory ──
//
// Who to poll. The directory is fetched fresh each cycle and replaced
// wholesale; the last good list is kept for status queries.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use sitewatch_api::FleetClient;
use tracing::{debug, info, warn};

use crate::model::Site;

/// Source of the site list.
#[async_trait]
pub trait SiteSource: Send + Sync {
    async fn list_sites(&self, directory: &str) -> Result<Vec<Site>, sitewatch_api::Error>;
}

#[async_trait]
impl SiteSource for FleetClient {
    async fn list_sites(&self, directory: &str) -> Result<Vec<Site>, sitewatch_api::Error> {
        let systems = self.list_systems(directory).await?;
        Ok(systems.into_iter().map(Site::from).collect())
    }
}

/// Cached view over a [`SiteSource`].
pub struct SiteDirectory {
    source: Arc<dyn SiteSource>,
    directory: String,
    current: ArcSwap<Vec<Site>>,
}

impl SiteDirectory {
    pub fn new(source: Arc<dyn SiteSource>, directory: impl Into<String>) -> Self {
        Self {
            source,
            directory: directory.into(),
            current: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Identifier the list is requested from.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Fetch the site list.
    ///
    /// Any failure yields an empty list for this call; the cached list
    /// keeps its last successful value.
    pub async fn refresh(&self) -> Arc<Vec<Site>> {
        match self.source.list_sites(&self.directory).await {
            Ok(sites) => {
                debug!(directory = %self.directory, count = sites.len(), "site directory refreshed");
                let sites = Arc::new(sites);
                self.current.store(Arc::clone(&sites));
                sites
            }
            Err(e) if e.is_auth_required() => {
                info!(directory = %self.directory, "site directory requires authentication");
                Arc::new(Vec::new())
            }
            Err(e) => {
                warn!(directory = %self.directory, error = %e, "site directory fetch failed");
                Arc::new(Vec::new())
            }
        }
    }

    /// Last successfully fetched list.
    pub fn current(&self) -> Arc<Vec<Site>> {
        self.current.load_full()
    }
}

impl std::fmt::Debug for SiteDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteDirectory")
            .field("directory", &self.directory)
            .field("cached", &self.current.load().len())
            .finish_non_exhaustive()
    }
}
