// ── Change detector ──
//
// Compares a fresh snapshot with the stored one. The capture timestamp is
// ignored; site and device order are ignored. Devices are matched across
// snapshots by `(site_id, device_id)`.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{Device, DeviceStatus, SitePoll, Snapshot};

/// A device whose normalized status differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub site_id: String,
    pub site_name: String,
    pub device_id: String,
    pub device_name: String,
    pub from: DeviceStatus,
    pub to: DeviceStatus,
}

impl Transition {
    pub fn is_back_online(&self) -> bool {
        self.from == DeviceStatus::Offline && self.to == DeviceStatus::Online
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Whether `current` should replace the stored snapshot.
    pub changed: bool,
    pub transitions: Vec<Transition>,
}

/// Diff `current` against `previous`. With no previous snapshot the result
/// is always `changed` and carries no transitions.
pub fn compare(previous: Option<&Snapshot>, current: &Snapshot) -> SnapshotDiff {
    let Some(previous) = previous else {
        return SnapshotDiff {
            changed: true,
            transitions: Vec::new(),
        };
    };

    let before: HashMap<&str, &SitePoll> = previous
        .sites
        .iter()
        .map(|s| (s.site_id.as_str(), s))
        .collect();

    let mut transitions = Vec::new();
    let mut changed = previous.total_devices != current.total_devices
        || previous.total_sites != current.total_sites
        || previous.successful_sites != current.successful_sites;

    for site in &current.sites {
        let Some(old) = before.get(site.site_id.as_str()) else {
            changed = true;
            continue;
        };
        if old.device_count != site.device_count
            || old.poll_status != site.poll_status
            || old.site_name != site.site_name
        {
            changed = true;
        }

        if device_keys(&old.devices) != device_keys(&site.devices) {
            changed = true;
        }

        let old_devices = index_devices(&old.devices);
        let mut seen = HashSet::new();
        for device in &site.devices {
            if !seen.insert(device.id.as_str()) {
                continue;
            }
            let Some(prior) = old_devices.get(device.id.as_str()) else {
                continue;
            };
            let (from, to) = (prior.normalized_status(), device.normalized_status());
            if from != to {
                transitions.push(Transition {
                    site_id: site.site_id.clone(),
                    site_name: site.site_name.clone(),
                    device_id: device.id.clone(),
                    device_name: device.name.clone(),
                    from,
                    to,
                });
            }
        }
    }

    SnapshotDiff {
        changed,
        transitions,
    }
}

/// First occurrence wins when an id repeats.
fn index_devices(devices: &[Device]) -> HashMap<&str, &Device> {
    let mut index = HashMap::with_capacity(devices.len());
    for device in devices {
        index.entry(device.id.as_str()).or_insert(device);
    }
    index
}

/// Order-free view of a device list: every `(id, name, status)` sorted,
/// duplicates kept.
fn device_keys(devices: &[Device]) -> Vec<(&str, &str, &str)> {
    let mut keys: Vec<_> = devices
        .iter()
        .map(|d| (d.id.as_str(), d.name.as_str(), d.status.as_str()))
        .collect();
    keys.sort_unstable();
    keys
}
