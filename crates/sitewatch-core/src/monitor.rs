// ── Monitor loop ──
//
// Top-level scheduler. Each cycle: refresh the directory, poll every
// reachable site, diff against the stored snapshot, announce devices that
// came back online, persist if anything changed.
//
// One background task per monitor. The ledger mutex is held for the whole
// cycle, so a manual `run_cycle()` and the timer never overlap.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sitewatch_api::{FleetClient, RemoteEvent, SiteRef};
use strum::Display;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::aggregate::{Aggregator, DeviceFetcher};
use crate::config::MonitorConfig;
use crate::detect::{self, Transition};
use crate::directory::{SiteDirectory, SiteSource};
use crate::ledger::NotificationLedger;
use crate::model::{DeviceStatus, Site, Snapshot};
use crate::notify::{EventSink, Notification, NotificationKind, Notifier};
use crate::store::{SnapshotBackend, SnapshotStore};

const REPORT_CHANNEL_SIZE: usize = 16;

// ── MonitorState ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MonitorState {
    Idle,
    Polling,
}

// ── CycleReport ──────────────────────────────────────────────────

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// The directory was empty; nothing was polled or written.
    pub skipped: bool,
    pub total_sites: usize,
    pub successful_sites: usize,
    pub total_devices: usize,
    /// A new snapshot was persisted. False when the poll matched the
    /// stored snapshot or when persisting failed.
    pub changed: bool,
    pub transitions: Vec<Transition>,
    /// Devices announced as back online this cycle.
    pub notified: usize,
}

impl CycleReport {
    fn skipped(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            skipped: true,
            total_sites: 0,
            successful_sites: 0,
            total_devices: 0,
            changed: false,
            transitions: Vec::new(),
            notified: 0,
        }
    }
}

// ── Monitor ──────────────────────────────────────────────────────

/// Collaborators a monitor is built from.
pub struct MonitorParts {
    pub sites: Arc<dyn SiteSource>,
    pub fetcher: Arc<dyn DeviceFetcher>,
    pub events: Arc<dyn EventSink>,
    pub notifier: Arc<dyn Notifier>,
    pub backend: Arc<dyn SnapshotBackend>,
}

impl MonitorParts {
    /// Directory, inventory and events all go through one fleet client.
    pub fn from_fleet(
        fleet: Arc<FleetClient>,
        backend: Arc<dyn SnapshotBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            sites: fleet.clone(),
            fetcher: fleet.clone(),
            events: fleet,
            notifier,
            backend,
        }
    }
}

/// Cheaply cloneable handle to one monitor instance.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    directory: SiteDirectory,
    aggregator: Aggregator,
    store: SnapshotStore,
    events: Arc<dyn EventSink>,
    notifier: Arc<dyn Notifier>,
    ledger: Mutex<NotificationLedger>,
    state: watch::Sender<MonitorState>,
    reports: broadcast::Sender<Arc<CycleReport>>,
    cancel: CancellationToken,
    task: Mutex<Option<RunningTask>>,
}

struct RunningTask {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Monitor {
    /// Build a monitor. Does not start it.
    pub fn new(config: MonitorConfig, parts: MonitorParts) -> Self {
        let (state, _) = watch::channel(MonitorState::Idle);
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_SIZE);
        let aggregator = Aggregator::new(parts.fetcher, config.fetch_timeout, config.max_concurrency);

        Self {
            inner: Arc::new(MonitorInner {
                directory: SiteDirectory::new(parts.sites, config.directory.clone()),
                aggregator,
                store: SnapshotStore::new(parts.backend),
                events: parts.events,
                notifier: parts.notifier,
                ledger: Mutex::new(NotificationLedger::new()),
                state,
                reports,
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
                config,
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start the background loop. Returns `false` (and does nothing) if it
    /// is already running.
    ///
    /// The loop restores the persisted snapshot if none is held yet, runs
    /// the first cycle immediately, then one cycle per `poll_interval`
    /// measured from cycle start.
    pub async fn start(&self) -> bool {
        let mut slot = self.inner.task.lock().await;
        if slot.is_some() {
            debug!("monitor already running");
            return false;
        }

        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(monitor_task(self.clone(), cancel.clone()));
        *slot = Some(RunningTask { handle, cancel });

        info!(
            interval = ?self.inner.config.poll_interval,
            directory = %self.inner.config.directory,
            "monitor started"
        );
        true
    }

    /// Stop the background loop. An in-flight cycle is dropped; per-site
    /// calls already on the wire finish on their own and are discarded.
    /// Returns `false` if the loop was not running.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.inner.task.lock().await.take() else {
            return false;
        };
        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!(error = %e, "monitor task ended abnormally");
        }
        self.inner.state.send_replace(MonitorState::Idle);
        info!("monitor stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.inner.task.lock().await.is_some()
    }

    // ── Status queries ───────────────────────────────────────────

    pub fn state(&self) -> watch::Receiver<MonitorState> {
        self.inner.state.subscribe()
    }

    pub fn current_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.store.current()
    }

    /// Last successfully fetched site list.
    pub fn sites(&self) -> Arc<Vec<Site>> {
        self.inner.directory.current()
    }

    pub fn subscribe_reports(&self) -> broadcast::Receiver<Arc<CycleReport>> {
        self.inner.reports.subscribe()
    }

    /// Restore the persisted snapshot. The loop does this on start; call
    /// it directly before a manual `run_cycle()`.
    pub async fn bootstrap(&self) -> Option<Arc<Snapshot>> {
        self.inner.store.bootstrap().await
    }

    // ── Cycle ────────────────────────────────────────────────────

    /// Run exactly one cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut ledger = self.inner.ledger.lock().await;
        self.inner.state.send_replace(MonitorState::Polling);

        let report = self.cycle(&mut ledger).await;

        self.inner.state.send_replace(MonitorState::Idle);
        let _ = self.inner.reports.send(Arc::new(report.clone()));
        report
    }

    async fn cycle(&self, ledger: &mut NotificationLedger) -> CycleReport {
        let started_at = Utc::now();

        let sites = self.inner.directory.refresh().await;
        if sites.is_empty() {
            info!("site directory is empty, skipping cycle");
            return CycleReport::skipped(started_at);
        }

        let current = self.inner.aggregator.poll_all(&sites).await;
        let previous = self.inner.store.current();
        let diff = detect::compare(previous.as_deref(), &current);

        let mut notified = 0;
        for transition in &diff.transitions {
            if transition.is_back_online()
                && ledger.should_notify_online(&transition.site_id, &transition.device_id)
            {
                self.announce(transition).await;
                ledger.record(&transition.site_id, &transition.device_id, DeviceStatus::Online);
                notified += 1;
            } else {
                ledger.record(&transition.site_id, &transition.device_id, transition.to);
            }
        }

        let (total_sites, successful_sites, total_devices) = (
            current.total_sites,
            current.successful_sites,
            current.total_devices,
        );

        let changed = if diff.changed {
            match self.inner.store.replace(current).await {
                Ok(_) => true,
                Err(e) => {
                    error!(error = %e, "failed to persist snapshot, treating cycle as unchanged");
                    false
                }
            }
        } else {
            false
        };

        info!(
            sites = total_sites,
            ok = successful_sites,
            devices = total_devices,
            changed,
            notified,
            "cycle complete"
        );

        CycleReport {
            started_at,
            skipped: false,
            total_sites,
            successful_sites,
            total_devices,
            changed,
            transitions: diff.transitions,
            notified,
        }
    }

    /// Post the remote event, then raise the local notification. Event
    /// failure is logged and not retried.
    async fn announce(&self, t: &Transition) {
        let site = SiteRef::new(&t.site_id, &t.site_name);
        let event = RemoteEvent {
            timestamp: Utc::now(),
            caption: format!("{} is back online", t.device_name),
            system_id: t.site_id.clone(),
            system_name: t.site_name.clone(),
        };

        let timeout = self.inner.config.fetch_timeout;
        match tokio::time::timeout(timeout, self.inner.events.emit(&site, &event)).await {
            Ok(Ok(())) => debug!(site = %t.site_id, device = %t.device_id, "online event posted"),
            Ok(Err(e)) => warn!(site = %t.site_id, device = %t.device_id, error = %e, "online event failed"),
            Err(_) => warn!(site = %t.site_id, device = %t.device_id, "online event timed out"),
        }

        self.inner.notifier.notify(&Notification {
            kind: NotificationKind::Success,
            title: "Device online".into(),
            message: format!("{} at {} is back online", t.device_name, t.site_name),
        });
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

// ── Background task ──────────────────────────────────────────────

async fn monitor_task(monitor: Monitor, cancel: CancellationToken) {
    if monitor.current_snapshot().is_none() {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            _ = monitor.bootstrap() => {}
        }
    }

    let mut interval = tokio::time::interval(monitor.inner.config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    report = monitor.run_cycle() => {
                        debug!(changed = report.changed, skipped = report.skipped, "monitor tick done");
                    }
                }
            }
        }
    }

    monitor.inner.state.send_replace(MonitorState::Idle);
    debug!("monitor task exiting");
}
