//! Configuration for the sitewatch CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to the runtime configs in `sitewatch_api` and
//! `sitewatch_core`. Runtime crates never read files themselves; they are
//! handed the structs built here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use sitewatch_api::route::{DEFAULT_DIRECTORY_URL, DEFAULT_GLOBAL_ALIAS, DEFAULT_RELAY_DOMAIN};
use sitewatch_api::{CredentialStore, LocalSite, RoutingConfig, TlsMode, TransportConfig};
use sitewatch_core::MonitorConfig;

/// Keyring service name all secrets are stored under.
pub const KEYRING_SERVICE: &str = "sitewatch";
/// Env var consulted for the directory bearer when a profile names none.
pub const DIRECTORY_TOKEN_ENV: &str = "SITEWATCH_DIRECTORY_TOKEN";
/// Env var consulted for the default local session when a profile names none.
pub const SESSION_ENV: &str = "SITEWATCH_SESSION";

const ENV_PREFIX: &str = "SITEWATCH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found in config")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Select a profile: the explicit name, else `default_profile`, else
    /// `"default"`. A missing `"default"` profile is synthesized from
    /// defaults; any other missing name is an error.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());

        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile.clone())),
            None if name == "default" => Ok((name, Profile::default())),
            None => Err(ConfigError::UnknownProfile { profile: name }),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named fleet profile. Every field is optional; unset fields fall back
/// to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Global directory base URL.
    pub directory_url: Option<String>,

    /// Domain relay hosts are built under.
    pub relay_domain: Option<String>,

    /// Reserved identifier meaning "all sites".
    pub global_alias: Option<String>,

    /// Identifier the monitor requests the site list from. Defaults to the
    /// global alias.
    pub directory: Option<String>,

    /// Statically configured local site.
    pub local_site: Option<LocalSiteConfig>,

    /// Directory bearer (plaintext; prefer keyring or env var).
    pub directory_token: Option<String>,

    /// Env var holding the directory bearer.
    pub directory_token_env: Option<String>,

    /// Default local session (plaintext; prefer keyring or env var).
    pub session: Option<String>,

    /// Env var holding the default local session.
    pub session_env: Option<String>,

    /// Per-site local sessions, keyed by site id (plaintext).
    #[serde(default)]
    pub sessions: HashMap<String, String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Monitor period, e.g. `"10s"`.
    pub poll_interval: Option<String>,

    /// Per-site fetch timeout, e.g. `"5s"`.
    pub fetch_timeout: Option<String>,

    /// Sites polled at once. 0 means unbounded.
    pub max_concurrency: Option<usize>,

    /// TTL of the relay GET cache used by interactive commands.
    pub cache_ttl: Option<String>,

    #[serde(default)]
    pub snapshot: SnapshotSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalSiteConfig {
    pub id: String,
    /// `host` or `host:port`.
    pub host: String,
}

/// Where the monitor persists its snapshot.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnapshotSettings {
    #[serde(default)]
    pub backend: SnapshotBackendKind,
    /// Endpoint for the `http` backend.
    pub url: Option<String>,
    /// File for the `file` backend. Defaults to the data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotBackendKind {
    Http,
    #[default]
    File,
    Memory,
}

/// Resolved snapshot backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotTarget {
    Http(Url),
    File(PathBuf),
    Memory,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "sitewatch", "sitewatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory the file snapshot backend writes to by default.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sitewatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is not an
/// error. Env vars use `__` as the nesting separator, e.g.
/// `SITEWATCH_PROFILES__DEFAULT__RELAY_DOMAIN`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Credential resolution ───────────────────────────────────────────

/// Where secrets are looked up. The system lookup reads the process
/// environment and the OS keyring.
pub struct SecretLookup<'a> {
    pub env: &'a dyn Fn(&str) -> Option<String>,
    pub keyring: &'a dyn Fn(&str) -> Option<String>,
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn keyring_lookup(user: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, user)
        .ok()?
        .get_password()
        .ok()
}

impl SecretLookup<'static> {
    pub fn system() -> Self {
        Self {
            env: &env_lookup,
            keyring: &keyring_lookup,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// env var → keyring entry → plaintext. Empty values count as unset.
fn resolve_secret(
    lookup: &SecretLookup<'_>,
    env_name: Option<&str>,
    keyring_user: &str,
    plaintext: Option<&String>,
) -> Option<SecretString> {
    env_name
        .and_then(|name| non_empty((lookup.env)(name)))
        .or_else(|| non_empty((lookup.keyring)(keyring_user)))
        .or_else(|| non_empty(plaintext.cloned()))
        .map(SecretString::from)
}

/// Directory bearer for a profile. `None` is a valid outcome.
pub fn resolve_directory_token(
    profile: &Profile,
    profile_name: &str,
    lookup: &SecretLookup<'_>,
) -> Option<SecretString> {
    resolve_secret(
        lookup,
        Some(profile.directory_token_env.as_deref().unwrap_or(DIRECTORY_TOKEN_ENV)),
        &format!("{profile_name}/directory-token"),
        profile.directory_token.as_ref(),
    )
}

/// Default local session for a profile.
pub fn resolve_default_session(
    profile: &Profile,
    profile_name: &str,
    lookup: &SecretLookup<'_>,
) -> Option<SecretString> {
    resolve_secret(
        lookup,
        Some(profile.session_env.as_deref().unwrap_or(SESSION_ENV)),
        &format!("{profile_name}/session"),
        profile.session.as_ref(),
    )
}

/// Local session for one site: keyring → plaintext `sessions` table.
pub fn resolve_site_session(
    profile: &Profile,
    profile_name: &str,
    site_id: &str,
    lookup: &SecretLookup<'_>,
) -> Option<SecretString> {
    resolve_secret(
        lookup,
        None,
        &format!("{profile_name}/session/{site_id}"),
        profile.sessions.get(site_id),
    )
}

/// Populate a credential store from a profile.
pub fn build_credentials(
    profile: &Profile,
    profile_name: &str,
    lookup: &SecretLookup<'_>,
) -> CredentialStore {
    let store = CredentialStore::new();
    store.set_directory_bearer(resolve_directory_token(profile, profile_name, lookup));
    store.set_default_session(resolve_default_session(profile, profile_name, lookup));
    for site_id in profile.sessions.keys() {
        if let Some(token) = resolve_site_session(profile, profile_name, site_id, lookup) {
            store.set_session(site_id, token);
        }
    }
    store
}

// ── Translation to runtime configs ──────────────────────────────────

fn parse_duration(field: &str, raw: Option<&String>, default: Duration) -> Result<Duration, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => humantime::parse_duration(raw.trim())
            .map_err(|e| invalid(field, format!("'{raw}': {e}"))),
    }
}

pub fn profile_to_routing_config(profile: &Profile) -> Result<RoutingConfig, ConfigError> {
    let raw_url = profile.directory_url.as_deref().unwrap_or(DEFAULT_DIRECTORY_URL);
    let directory_url = Url::parse(raw_url)
        .map_err(|e| invalid("directory_url", format!("'{raw_url}': {e}")))?;

    let relay_domain = profile
        .relay_domain
        .as_deref()
        .unwrap_or(DEFAULT_RELAY_DOMAIN)
        .trim_matches('.')
        .to_owned();
    if relay_domain.is_empty() {
        return Err(invalid("relay_domain", "must not be empty"));
    }

    let global_alias = profile
        .global_alias
        .clone()
        .unwrap_or_else(|| DEFAULT_GLOBAL_ALIAS.into());

    let local_site = profile.local_site.as_ref().map(|l| LocalSite {
        id: l.id.clone(),
        host: l.host.clone(),
    });

    Ok(RoutingConfig {
        global_alias,
        relay_domain,
        local_site,
        ..RoutingConfig::new(directory_url)
    })
}

pub fn profile_to_transport_config(profile: &Profile, defaults: &Defaults) -> TransportConfig {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    }
}

pub fn profile_to_monitor_config(profile: &Profile) -> Result<MonitorConfig, ConfigError> {
    let defaults = MonitorConfig::default();
    let poll_interval = parse_duration(
        "poll_interval",
        profile.poll_interval.as_ref(),
        defaults.poll_interval,
    )?;
    if poll_interval.is_zero() {
        return Err(invalid("poll_interval", "must be greater than zero"));
    }

    let directory = profile
        .directory
        .clone()
        .or_else(|| profile.global_alias.clone())
        .unwrap_or(defaults.directory);

    Ok(MonitorConfig {
        poll_interval,
        fetch_timeout: parse_duration(
            "fetch_timeout",
            profile.fetch_timeout.as_ref(),
            defaults.fetch_timeout,
        )?,
        max_concurrency: profile.max_concurrency.unwrap_or(defaults.max_concurrency),
        directory,
    })
}

/// Relay cache TTL for interactive commands. `None` disables the cache.
pub fn relay_cache_ttl(profile: &Profile) -> Result<Option<Duration>, ConfigError> {
    profile
        .cache_ttl
        .as_ref()
        .map(|raw| parse_duration("cache_ttl", Some(raw), Duration::ZERO))
        .transpose()
        .map(|ttl| ttl.filter(|d| !d.is_zero()))
}

pub fn snapshot_target(profile: &Profile, profile_name: &str) -> Result<SnapshotTarget, ConfigError> {
    let settings = &profile.snapshot;
    match settings.backend {
        SnapshotBackendKind::Memory => Ok(SnapshotTarget::Memory),
        SnapshotBackendKind::File => Ok(SnapshotTarget::File(
            settings
                .path
                .clone()
                .unwrap_or_else(|| data_dir().join(format!("snapshot-{profile_name}.json"))),
        )),
        SnapshotBackendKind::Http => {
            let raw = settings
                .url
                .as_deref()
                .ok_or_else(|| invalid("snapshot.url", "required for the http backend"))?;
            Url::parse(raw)
                .map(SnapshotTarget::Http)
                .map_err(|e| invalid("snapshot.url", format!("'{raw}': {e}")))
        }
    }
}
