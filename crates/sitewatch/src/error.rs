//! CLI error types with miette diagnostics.
//!
//! Maps core, transport, and config errors into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use sitewatch_config::ConfigError;
use sitewatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach {site}: {reason}")]
    #[diagnostic(
        code(sitewatch::connection_failed),
        help(
            "Check that the site or relay is reachable.\n\
             Try: sitewatch route {site}"
        )
    )]
    ConnectionFailed { site: String, reason: String },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(sitewatch::tls_error),
        help("Use --insecure (-k) to accept self-signed certificates, or configure ca_cert in your profile.")
    )]
    TlsError { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication required for {site}")]
    #[diagnostic(
        code(sitewatch::auth_required),
        help(
            "Provide a session for this site in the profile's [sessions] table,\n\
             or a directory token via --token or SITEWATCH_DIRECTORY_TOKEN."
        )
    )]
    AuthRequired { site: String },

    // ── Remote ───────────────────────────────────────────────────────

    #[error("{site} answered HTTP {status}: {message}")]
    #[diagnostic(code(sitewatch::request_failed))]
    RequestFailed {
        site: String,
        status: u16,
        message: String,
    },

    #[error("Site '{identifier}' not found")]
    #[diagnostic(code(sitewatch::not_found), help("Run: sitewatch sites to see available sites"))]
    NotFound { identifier: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sitewatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sitewatch::profile_not_found),
        help("Available profiles: {available}\nConfig file: {path}")
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("{0}")]
    #[diagnostic(code(sitewatch::config))]
    Config(String),

    // ── Monitor ──────────────────────────────────────────────────────

    #[error("Snapshot store error: {0}")]
    #[diagnostic(code(sitewatch::snapshot))]
    Snapshot(String),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(sitewatch::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthRequired { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthRequired { site_id, site_name } => CliError::AuthRequired {
                site: display_site(&site_id, &site_name),
            },

            CoreError::ConnectionFailed {
                site_id,
                site_name,
                reason,
            } => CliError::ConnectionFailed {
                site: display_site(&site_id, &site_name),
                reason,
            },

            CoreError::RequestFailed {
                site_id,
                site_name,
                status: 404,
                ..
            } => CliError::NotFound {
                identifier: display_site(&site_id, &site_name),
            },

            CoreError::RequestFailed {
                site_id,
                site_name,
                status,
                message,
            } => CliError::RequestFailed {
                site: display_site(&site_id, &site_name),
                status,
                message,
            },

            CoreError::SnapshotPersistence { message } => CliError::Snapshot(message),

            CoreError::Config { message } if message.starts_with("TLS") => {
                CliError::TlsError { message }
            }

            CoreError::Config { message } | CoreError::Internal(message) => CliError::Config(message),
        }
    }
}

impl From<sitewatch_api::Error> for CliError {
    fn from(err: sitewatch_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: String::new(),
                path: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}

fn display_site(id: &str, name: &str) -> String {
    if name.is_empty() || name == id {
        id.to_owned()
    } else {
        format!("{name} ({id})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status_maps_to_not_found_exit_code() {
        let err = CliError::from(sitewatch_api::Error::RequestFailed {
            message: "HTTP 404".into(),
            site_id: "s1".into(),
            site_name: "HQ".into(),
            status: 404,
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "Site 'HQ (s1)' not found");
    }

    #[test]
    fn auth_required_maps_to_auth_exit_code() {
        let err = CliError::from(CoreError::AuthRequired {
            site_id: "s1".into(),
            site_name: "s1".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert_eq!(err.to_string(), "Authentication required for s1");
    }

    #[test]
    fn tls_config_errors_get_tls_help() {
        let err = CliError::from(sitewatch_api::Error::Tls("failed to read CA cert".into()));
        assert!(matches!(err, CliError::TlsError { .. }));
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }
}
