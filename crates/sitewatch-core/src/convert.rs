// ── Wire-to-domain conversions ──
//
// Records arrive already shape-checked by sitewatch-api; these impls only
// normalize the loose string fields into domain enums.

use sitewatch_api::{DeviceRecord, SystemRecord};

use crate::model::{AccessRole, Device, HealthState, Site};

impl From<SystemRecord> for Site {
    fn from(record: SystemRecord) -> Self {
        let name = if record.name.trim().is_empty() {
            record.id.clone()
        } else {
            record.name
        };
        Self {
            health: HealthState::from_reported(record.state_of_health.as_deref()),
            role: AccessRole::from_reported(record.access_role.as_deref()),
            id: record.id,
            name,
        }
    }
}

impl Device {
    /// Tag a site-reported record with its owning site.
    pub fn from_record(record: DeviceRecord, site_id: &str) -> Self {
        Self {
            id: record.id,
            name: record.name,
            status: record.status,
            site_id: site_id.to_owned(),
        }
    }
}
