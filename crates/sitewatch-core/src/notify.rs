// ── Notification side effects ──
//
// Two outlets fire when a device comes back online: a remote event posted
// to the owning site, and a local user-facing notification. Both are
// fire-and-forget from the monitor's point of view.

use async_trait::async_trait;
use serde::Serialize;
use sitewatch_api::{FleetClient, RemoteEvent, SiteRef};
use strum::Display;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// User-facing notification: `{type, title, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Local notification outlet. Return values are never consulted.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: &Notification) {
        match n.kind {
            NotificationKind::Info | NotificationKind::Success => {
                info!(kind = %n.kind, title = %n.title, "{}", n.message);
            }
            NotificationKind::Warning => warn!(title = %n.title, "{}", n.message),
            NotificationKind::Error => error!(title = %n.title, "{}", n.message),
        }
    }
}

/// Remote outlet: posts an event to a site.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, site: &SiteRef, event: &RemoteEvent) -> Result<(), sitewatch_api::Error>;
}

#[async_trait]
impl EventSink for FleetClient {
    async fn emit(&self, site: &SiteRef, event: &RemoteEvent) -> Result<(), sitewatch_api::Error> {
        self.emit_event(site, event).await
    }
}
