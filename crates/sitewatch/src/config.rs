//! CLI configuration: thin wrapper around `sitewatch_config`.
//!
//! Adds the `GlobalOpts` overrides (--config, --profile, --directory-url,
//! --token, --insecure, --timeout) and assembles the runtime pieces the
//! commands need.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use sitewatch_api::{CredentialStore, FleetClient, RelayClient, Router, TransportConfig};
use sitewatch_config::{
    Config, ConfigError, Profile, SecretLookup, SnapshotTarget, build_credentials,
    profile_to_monitor_config, profile_to_routing_config, profile_to_transport_config,
    relay_cache_ttl, snapshot_target,
};
use sitewatch_core::{FileBackend, HttpBackend, MemoryBackend, MonitorConfig, SnapshotBackend};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config` if given, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(sitewatch_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(sitewatch_config::load_config_from(&config_file(global))?)
}

/// Select the active profile and apply flag overrides to it.
pub fn active_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    let (name, mut profile) = cfg.profile(global.profile.as_deref()).map_err(|e| match e {
        ConfigError::UnknownProfile { profile } => {
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();
            CliError::ProfileNotFound {
                name: profile,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
                path: config_file(global).display().to_string(),
            }
        }
        other => other.into(),
    })?;

    if let Some(ref url) = global.directory_url {
        profile.directory_url = Some(url.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    Ok((name, profile))
}

// ── Runtime assembly ────────────────────────────────────────────────

/// Everything a command needs to talk to the fleet.
pub struct Runtime {
    pub profile_name: String,
    pub profile: Profile,
    pub router: Router,
    pub credentials: Arc<CredentialStore>,
    pub transport: TransportConfig,
    pub monitor: MonitorConfig,
}

impl Runtime {
    pub fn from_globals(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = load(global)?;
        let (profile_name, profile) = active_profile(global, &cfg)?;

        let router = Router::new(profile_to_routing_config(&profile)?);
        let transport = profile_to_transport_config(&profile, &cfg.defaults);
        let monitor = profile_to_monitor_config(&profile)?;

        let credentials = build_credentials(&profile, &profile_name, &SecretLookup::system());
        if let Some(ref token) = global.token {
            credentials.set_directory_bearer(Some(SecretString::from(token.clone())));
        }

        Ok(Self {
            profile_name,
            profile,
            router,
            credentials: Arc::new(credentials),
            transport,
            monitor,
        })
    }

    /// Fleet client for one-shot commands, with the relay cache if the
    /// profile configures one.
    pub fn interactive_fleet(&self) -> Result<FleetClient, CliError> {
        let mut relay = RelayClient::new(&self.transport)?;
        if let Some(ttl) = relay_cache_ttl(&self.profile)? {
            relay = relay.with_cache(ttl);
        }
        Ok(self.fleet_with(relay))
    }

    /// Fleet client for the monitor. Never cached.
    pub fn monitor_fleet(&self) -> Result<FleetClient, CliError> {
        Ok(self.fleet_with(RelayClient::new(&self.transport)?))
    }

    fn fleet_with(&self, relay: RelayClient) -> FleetClient {
        FleetClient::new(self.router.clone(), Arc::clone(&self.credentials), relay)
    }

    pub fn snapshot_backend(&self) -> Result<Arc<dyn SnapshotBackend>, CliError> {
        let backend: Arc<dyn SnapshotBackend> = match snapshot_target(&self.profile, &self.profile_name)? {
            SnapshotTarget::Memory => Arc::new(MemoryBackend::new()),
            SnapshotTarget::File(path) => Arc::new(FileBackend::new(path)),
            SnapshotTarget::Http(url) => {
                let relay = RelayClient::new(&self.transport)?;
                Arc::new(HttpBackend::new(relay, url).with_headers(self.snapshot_headers()?))
            }
        };
        Ok(backend)
    }

    /// The HTTP snapshot store is authorized with the directory bearer.
    fn snapshot_headers(&self) -> Result<HeaderMap, CliError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.credentials.directory_bearer() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| CliError::Validation {
                    field: "directory token".into(),
                    reason: "contains characters not allowed in a header".into(),
                })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}
