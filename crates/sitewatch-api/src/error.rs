use thiserror::Error;

/// Top-level error type for the `sitewatch-api` crate.
///
/// The first three variants are the normalized outcome taxonomy of a relay
/// call. Every remote failure, whatever path it took, lands in one of them.
/// `sitewatch-core` contains these at the aggregator boundary.
#[derive(Debug, Error)]
pub enum Error {
    // ── Relay outcomes ──────────────────────────────────────────────
    /// HTTP 401/403. A signal for the caller to start a login flow, not a
    /// generic failure.
    #[error("Authentication required for site {site_name} ({site_id})")]
    AuthRequired { site_id: String, site_name: String },

    /// Any other non-success status, or a JSON body that failed to parse
    /// (reported as 502).
    #[error("Request to site {site_name} failed (HTTP {status}): {message}")]
    RequestFailed {
        message: String,
        site_id: String,
        site_name: String,
        status: u16,
    },

    /// Connection refused, DNS failure, timeout, or any other transport
    /// failure that produced no HTTP status.
    #[error("Cannot reach site {site_name} ({site_id}): {reason}")]
    Connection {
        site_id: String,
        site_name: String,
        reason: String,
    },

    // ── Local setup ─────────────────────────────────────────────────
    /// URL parsing error while building a target address.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// Returns `true` if the caller should trigger a login flow.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }

    /// Returns `true` if this is a transport failure worth retrying later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::RequestFailed { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Returns `true` if the remote answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RequestFailed { status: 404, .. })
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The site this error refers to, if it came from a relay call.
    pub fn site_id(&self) -> Option<&str> {
        match self {
            Self::AuthRequired { site_id, .. }
            | Self::RequestFailed { site_id, .. }
            | Self::Connection { site_id, .. } => Some(site_id),
            _ => None,
        }
    }
}
