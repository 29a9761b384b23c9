// ── Site domain type ──

use serde::{Deserialize, Serialize};
use sitewatch_api::SiteRef;
use strum::{Display, EnumString};

/// Directory-reported reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HealthState {
    Online,
    Offline,
}

impl HealthState {
    /// Only an explicit `"offline"` counts as offline. A missing or
    /// unrecognized value keeps the site in the poll set.
    pub fn from_reported(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("offline") => Self::Offline,
            _ => Self::Online,
        }
    }
}

/// The caller's role on a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccessRole {
    Owner,
    Other,
}

impl AccessRole {
    pub fn from_reported(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("owner") => Self::Owner,
            _ => Self::Other,
        }
    }
}

/// A remote system known to the directory. Replaced wholesale on every
/// directory refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: String,
    pub health: HealthState,
    pub role: AccessRole,
}

impl Site {
    pub fn is_offline(&self) -> bool {
        self.health == HealthState::Offline
    }

    /// Identity carried into transport errors.
    pub fn site_ref(&self) -> SiteRef {
        SiteRef::new(&self.id, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_offline_is_offline() {
        assert_eq!(HealthState::from_reported(Some("OFFLINE")), HealthState::Offline);
        assert_eq!(HealthState::from_reported(Some(" offline ")), HealthState::Offline);
        assert_eq!(HealthState::from_reported(Some("degraded")), HealthState::Online);
        assert_eq!(HealthState::from_reported(None), HealthState::Online);
    }

    #[test]
    fn role_defaults_to_other() {
        assert_eq!(AccessRole::from_reported(Some("Owner")), AccessRole::Owner);
        assert_eq!(AccessRole::from_reported(Some("viewer")), AccessRole::Other);
        assert_eq!(AccessRole::from_reported(None), AccessRole::Other);
    }
}
