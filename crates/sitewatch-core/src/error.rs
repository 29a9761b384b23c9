// ── Core error types ──
//
// Errors surfaced by sitewatch-core. Remote-site failures are normally
// contained at the aggregator boundary and never reach callers of the
// monitor; these types cover the interactive paths (directory listing,
// single-site queries) and the monitor's own bookkeeping.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote site errors ───────────────────────────────────────────
    #[error("Authentication required for {site_name} ({site_id})")]
    AuthRequired { site_id: String, site_name: String },

    #[error("Cannot reach {site_name} ({site_id}): {reason}")]
    ConnectionFailed {
        site_id: String,
        site_name: String,
        reason: String,
    },

    #[error("Request to {site_name} failed (HTTP {status}): {message}")]
    RequestFailed {
        site_id: String,
        site_name: String,
        status: u16,
        message: String,
    },

    // ── Bookkeeping errors ───────────────────────────────────────────
    #[error("Snapshot persistence failed: {message}")]
    SnapshotPersistence { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sitewatch_api::Error> for CoreError {
    fn from(err: sitewatch_api::Error) -> Self {
        match err {
            sitewatch_api::Error::AuthRequired { site_id, site_name } => {
                CoreError::AuthRequired { site_id, site_name }
            }
            sitewatch_api::Error::RequestFailed {
                message,
                site_id,
                site_name,
                status,
            } => CoreError::RequestFailed {
                site_id,
                site_name,
                status,
                message,
            },
            sitewatch_api::Error::Connection {
                site_id,
                site_name,
                reason,
            } => CoreError::ConnectionFailed {
                site_id,
                site_name,
                reason,
            },
            sitewatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            sitewatch_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SnapshotPersistence {
            message: format!("snapshot encoding: {err}"),
        }
    }
}
