//! Fleet polling and change detection on top of `sitewatch-api`.
//!
//! - **[`Monitor`]**: the scheduler. [`start()`](Monitor::start) spawns one
//!   background loop that refreshes the [`SiteDirectory`], polls every
//!   reachable site through the [`Aggregator`], diffs the result against the
//!   [`SnapshotStore`] with [`compare`], and announces devices that come back
//!   online. [`run_cycle()`](Monitor::run_cycle) runs a single cycle.
//!
//! - **Seams**: [`SiteSource`], [`DeviceFetcher`], [`EventSink`] and
//!   [`SnapshotBackend`] are implemented for the real fleet client and
//!   backends, and faked in tests.
//!
//! - **Domain model** ([`model`]): [`Site`], [`Device`], [`Snapshot`].

pub mod aggregate;
pub mod config;
pub mod convert;
pub mod detect;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────
pub use aggregate::{Aggregator, DeviceFetcher};
pub use config::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_CONCURRENCY, DEFAULT_POLL_INTERVAL, MonitorConfig};
pub use detect::{SnapshotDiff, Transition, compare};
pub use directory::{SiteDirectory, SiteSource};
pub use error::CoreError;
pub use ledger::NotificationLedger;
pub use monitor::{CycleReport, Monitor, MonitorParts, MonitorState};
pub use notify::{EventSink, Notification, NotificationKind, Notifier, TracingNotifier};
pub use store::{FileBackend, HttpBackend, MemoryBackend, SnapshotBackend, SnapshotStore};

// ── Model re-exports ────────────────────────────────────────────
pub use model::{
    AccessRole, Device, DeviceStatus, HealthState, PollStatus, Site, SitePoll, Snapshot,
};
