// ── Runtime monitor configuration ──
//
// These types describe *how* the monitor runs. They never touch disk:
// the CLI (via sitewatch-config) builds a `MonitorConfig` and hands it in.

use std::time::Duration;

use sitewatch_api::route::DEFAULT_GLOBAL_ALIAS;

/// Poll period of the monitor loop. This constant is the only place the
/// value is defined; log messages read it from the config.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Upper bound on a single site's inventory fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of sites polled at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Configuration for the monitor loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Fixed period between cycle starts.
    pub poll_interval: Duration,
    /// Per-site fetch timeout. A timeout counts as a failed poll.
    pub fetch_timeout: Duration,
    /// Fan-out bound. 0 means unbounded.
    pub max_concurrency: usize,
    /// Identifier the site list is requested from (the global alias, or a
    /// local relay alias).
    pub directory: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            directory: DEFAULT_GLOBAL_ALIAS.into(),
        }
    }
}
