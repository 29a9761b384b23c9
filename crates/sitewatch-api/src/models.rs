// Wire types
//
// Payload shapes exchanged with the directory and with individual sites.
// Parsing happens here, at the transport boundary: anything that doesn't
// fit these shapes is dropped or rejected before it reaches the core.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

/// One system as reported by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// `"online"` / `"offline"`; absent on some directory versions.
    #[serde(default)]
    pub state_of_health: Option<String>,
    /// `"owner"` or any other role string.
    #[serde(default)]
    pub access_role: Option<String>,
}

/// One device as reported by a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Free-form status string (`"Online"`, `"Offline"`, `"Recording"`, ...).
    #[serde(default)]
    pub status: String,
}

/// Event posted to a site when one of its devices comes back online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    #[serde(serialize_with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    pub caption: String,
    pub system_id: String,
    pub system_name: String,
}

fn iso8601<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parse a directory listing: `{"systems": [...]}` or a bare array.
///
/// Entries without an `id` are dropped. Any other top-level shape is an
/// error describing what was received.
pub fn parse_systems(value: Value) -> Result<Vec<SystemRecord>, String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("systems") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => return Err(format!("`systems` is {}, not an array", kind(&other))),
        },
        Value::Null => Vec::new(),
        other => return Err(format!("expected a system list, got {}", kind(&other))),
    };
    Ok(parse_items("system", items))
}

/// Parse a device inventory: a bare array, or `null` for "nothing".
pub fn parse_devices(value: Value) -> Result<Vec<DeviceRecord>, String> {
    match value {
        Value::Array(items) => Ok(parse_items("device", items)),
        Value::Null => Ok(Vec::new()),
        other => Err(format!("expected a device array, got {}", kind(&other))),
    }
}

fn parse_items<T>(what: &'static str, items: Vec<Value>) -> Vec<T>
where
    T: serde::de::DeserializeOwned + HasId,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(parsed) if parsed.id().trim().is_empty() => {
                warn!(what, "dropping entry with empty id");
                None
            }
            Ok(parsed) if !seen.insert(parsed.id().to_owned()) => {
                warn!(what, id = parsed.id(), "dropping duplicate id");
                None
            }
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(what, error = %e, "dropping malformed entry");
                None
            }
        })
        .collect()
}

trait HasId {
    fn id(&self) -> &str;
}

impl HasId for SystemRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl HasId for DeviceRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
