// ── Notification ledger ──
//
// Last status already acted on, per `(site_id, device_id)`. Owned by one
// monitor; nothing here is persisted, so a restart may notify once more.

use std::collections::HashMap;

use crate::model::DeviceStatus;

#[derive(Debug, Clone, Default)]
pub struct NotificationLedger {
    entries: HashMap<(String, String), DeviceStatus>,
}

impl NotificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, site_id: &str, device_id: &str) -> Option<DeviceStatus> {
        self.entries
            .get(&(site_id.to_owned(), device_id.to_owned()))
            .copied()
    }

    pub fn record(&mut self, site_id: &str, device_id: &str, status: DeviceStatus) {
        self.entries
            .insert((site_id.to_owned(), device_id.to_owned()), status);
    }

    /// True unless the device was already handled as online.
    pub fn should_notify_online(&self, site_id: &str, device_id: &str) -> bool {
        self.get(site_id, device_id) != Some(DeviceStatus::Online)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
