// ── Device domain types ──

use serde::{Deserialize, Serialize};
use strum::Display;

/// Comparison view of a device's free-form status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Other,
}

impl DeviceStatus {
    /// Case-insensitive normalization. Anything that isn't exactly
    /// online/offline is `Other`.
    pub fn normalize(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("online") {
            Self::Online
        } else if raw.eq_ignore_ascii_case("offline") {
            Self::Offline
        } else {
            Self::Other
        }
    }
}

/// One inventoried endpoint at a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    /// Status exactly as the site reported it.
    pub status: String,
    /// Owning site. A back-reference only.
    pub site_id: String,
}

impl Device {
    pub fn normalized_status(&self) -> DeviceStatus {
        DeviceStatus::normalize(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_normalization_is_case_insensitive() {
        assert_eq!(DeviceStatus::normalize("ONLINE"), DeviceStatus::Online);
        assert_eq!(DeviceStatus::normalize("Offline"), DeviceStatus::Offline);
        assert_eq!(DeviceStatus::normalize("Recording"), DeviceStatus::Other);
        assert_eq!(DeviceStatus::normalize(""), DeviceStatus::Other);
    }
}
