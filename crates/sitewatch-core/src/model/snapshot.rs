// ── Snapshot types ──
//
// One complete aggregate across all polled sites. Immutable once built;
// the store swaps whole snapshots, never patches one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::Device;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Success,
    Failed,
}

/// Outcome of polling one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePoll {
    pub site_id: String,
    pub site_name: String,
    pub device_count: usize,
    pub poll_status: PollStatus,
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl SitePoll {
    pub fn success(site_id: String, site_name: String, devices: Vec<Device>) -> Self {
        Self {
            site_id,
            site_name,
            device_count: devices.len(),
            poll_status: PollStatus::Success,
            devices,
        }
    }

    pub fn failed(site_id: String, site_name: String) -> Self {
        Self {
            site_id,
            site_name,
            device_count: 0,
            poll_status: PollStatus::Failed,
            devices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub sites: Vec<SitePoll>,
    pub total_sites: usize,
    pub successful_sites: usize,
    pub total_devices: usize,
}

impl Snapshot {
    /// Build a snapshot and derive the summary counts from `sites`.
    pub fn from_polls(taken_at: DateTime<Utc>, sites: Vec<SitePoll>) -> Self {
        let successful_sites = sites
            .iter()
            .filter(|s| s.poll_status == PollStatus::Success)
            .count();
        let total_devices = sites.iter().map(|s| s.device_count).sum();
        Self {
            taken_at,
            total_sites: sites.len(),
            successful_sites,
            total_devices,
            sites,
        }
    }

    pub fn site(&self, site_id: &str) -> Option<&SitePoll> {
        self.sites.iter().find(|s| s.site_id == site_id)
    }

    /// Iterate every device paired with its owning site.
    pub fn devices(&self) -> impl Iterator<Item = (&SitePoll, &Device)> {
        self.sites
            .iter()
            .flat_map(|site| site.devices.iter().map(move |d| (site, d)))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn device(id: &str, status: &str) -> Device {
        Device {
            id: id.into(),
            name: id.into(),
            status: status.into(),
            site_id: "s1".into(),
        }
    }

    #[test]
    fn summary_counts_follow_site_polls() {
        let snap = Snapshot::from_polls(
            Utc::now(),
            vec![
                SitePoll::success("s1".into(), "HQ".into(), vec![device("a", "online"), device("b", "offline")]),
                SitePoll::failed("s2".into(), "Depot".into()),
            ],
        );
        assert_eq!(snap.total_sites, 2);
        assert_eq!(snap.successful_sites, 1);
        assert_eq!(snap.total_devices, 2);
        assert_eq!(snap.devices().count(), 2);
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let poll = SitePoll::failed("s2".into(), "Depot".into());
        assert_eq!(
            serde_json::to_value(&poll).expect("serialize"),
            json!({
                "siteId": "s2",
                "siteName": "Depot",
                "deviceCount": 0,
                "pollStatus": "failed",
                "devices": []
            })
        );
    }
}
