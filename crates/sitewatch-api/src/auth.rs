// Credential storage and resolution
//
// Two mutually exclusive credential forms reach a site: a per-site local
// session, or the process-wide directory bearer. The resolver is an ordered
// list of strategies, each answering found / not-found; the first hit wins.

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::route::{AddressClass, normalize_identifier};

/// Header carrying the directory bearer alongside a local session on
/// relay calls.
pub const DIRECTORY_AUTH_HEADER: &str = "x-directory-authorization";

/// Which credential form was attached to a call.
///
/// Marker enum (no data) -- the secret material lives in [`CredentialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// A session scoped to one site (or the default local session).
    LocalSession,
    /// The process-wide directory token.
    DirectoryBearer,
    /// Forwarded inbound headers. Deprecated fallback.
    Passthrough,
    /// Nothing attached.
    Anonymous,
}

impl CredentialKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalSession => "local-session",
            Self::DirectoryBearer => "directory-bearer",
            Self::Passthrough => "passthrough",
            Self::Anonymous => "anonymous",
        }
    }
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential with its secret material.
#[derive(Debug, Clone)]
pub enum Credential {
    LocalSession { token: SecretString },
    DirectoryBearer { token: SecretString },
}

impl Credential {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::LocalSession { .. } => CredentialKind::LocalSession,
            Self::DirectoryBearer { .. } => CredentialKind::DirectoryBearer,
        }
    }

    fn token(&self) -> &SecretString {
        match self {
            Self::LocalSession { token } | Self::DirectoryBearer { token } => token,
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────

/// Read-mostly credential cache.
///
/// Written by the login flow; the resolver only reads. Empty tokens are
/// treated as absent.
#[derive(Default)]
pub struct CredentialStore {
    /// Local sessions keyed by normalized site identifier.
    sessions: DashMap<String, SecretString>,
    default_session: ArcSwapOption<SecretString>,
    directory_bearer: ArcSwapOption<SecretString>,
    passthrough: ArcSwapOption<HeaderMap>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("sessions", &self.sessions.len())
            .field("default_session", &self.default_session.load().is_some())
            .field("directory_bearer", &self.directory_bearer.load().is_some())
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_session(&self, site: &str, token: SecretString) {
        debug!(site, "storing local session");
        self.sessions
            .insert(normalize_identifier(site).to_owned(), token);
    }

    pub fn remove_session(&self, site: &str) -> bool {
        self.sessions.remove(normalize_identifier(site)).is_some()
    }

    /// The session registered under exactly this site, if non-empty.
    pub fn session(&self, site: &str) -> Option<SecretString> {
        self.sessions
            .get(normalize_identifier(site))
            .map(|s| s.value().clone())
            .filter(not_empty)
    }

    pub fn set_default_session(&self, token: Option<SecretString>) {
        self.default_session.store(token.map(Into::into));
    }

    pub fn default_session(&self) -> Option<SecretString> {
        self.default_session
            .load_full()
            .map(|s| (*s).clone())
            .filter(not_empty)
    }

    pub fn set_directory_bearer(&self, token: Option<SecretString>) {
        self.directory_bearer.store(token.map(Into::into));
    }

    pub fn directory_bearer(&self) -> Option<SecretString> {
        self.directory_bearer
            .load_full()
            .map(|s| (*s).clone())
            .filter(not_empty)
    }

    /// Forward opaque inbound headers when nothing else is available.
    #[deprecated(note = "opaque header passthrough is kept for old deployments; \
                         register a local session or a directory bearer instead")]
    pub fn set_passthrough(&self, headers: Option<HeaderMap>) {
        self.passthrough.store(headers.map(Into::into));
    }

    fn passthrough(&self) -> Option<HeaderMap> {
        self.passthrough
            .load_full()
            .map(|h| (*h).clone())
            .filter(|h| !h.is_empty())
    }
}

fn not_empty(secret: &SecretString) -> bool {
    !secret.expose_secret().trim().is_empty()
}

// ── Resolution ───────────────────────────────────────────────────────

/// Inputs to a resolution: the target and a view of the credential cache.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub identifier: &'a str,
    pub class: AddressClass,
    pub credentials: &'a CredentialStore,
}

/// The header set to attach and which credential it came from.
#[derive(Debug, Clone)]
pub struct ResolvedAuth {
    pub headers: HeaderMap,
    pub kind: CredentialKind,
    /// Name of the strategy that produced this result.
    pub strategy: &'static str,
    /// Whether the directory bearer rides along as a secondary header.
    pub secondary_bearer: bool,
}

impl ResolvedAuth {
    pub fn anonymous() -> Self {
        Self {
            headers: HeaderMap::new(),
            kind: CredentialKind::Anonymous,
            strategy: "none",
            secondary_bearer: false,
        }
    }
}

/// One step of the resolution chain.
pub trait ResolveStrategy: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// `Some` if this strategy found a usable credential.
    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<ResolvedAuth>;
}

/// Session registered under the exact site identifier.
#[derive(Debug, Default)]
pub struct SiteSession;

/// The process-wide default local session.
#[derive(Debug, Default)]
pub struct DefaultSession;

/// The directory bearer, alone.
#[derive(Debug, Default)]
pub struct DirectoryBearer;

/// Forwarded inbound headers. Deprecated last resort.
#[derive(Debug, Default)]
pub struct Passthrough;

impl ResolveStrategy for SiteSession {
    fn name(&self) -> &'static str {
        "site-session"
    }

    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<ResolvedAuth> {
        if request.class == AddressClass::GlobalAlias {
            return None;
        }
        let token = request.credentials.session(request.identifier)?;
        local_session_auth(self.name(), &token, request)
    }
}

impl ResolveStrategy for DefaultSession {
    fn name(&self) -> &'static str {
        "default-session"
    }

    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<ResolvedAuth> {
        if request.class == AddressClass::GlobalAlias {
            return None;
        }
        let token = request.credentials.default_session()?;
        local_session_auth(self.name(), &token, request)
    }
}

impl ResolveStrategy for DirectoryBearer {
    fn name(&self) -> &'static str {
        "directory-bearer"
    }

    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<ResolvedAuth> {
        let credential = Credential::DirectoryBearer {
            token: request.credentials.directory_bearer()?,
        };
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer_value(self.name(), &credential)?);
        Some(ResolvedAuth {
            headers,
            kind: credential.kind(),
            strategy: self.name(),
            secondary_bearer: false,
        })
    }
}

impl ResolveStrategy for Passthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn resolve(&self, request: &ResolveRequest<'_>) -> Option<ResolvedAuth> {
        let headers = request.credentials.passthrough()?;
        warn!(
            identifier = request.identifier,
            "forwarding passthrough headers: no session or bearer available"
        );
        Some(ResolvedAuth {
            headers,
            kind: CredentialKind::Passthrough,
            strategy: self.name(),
            secondary_bearer: false,
        })
    }
}

/// Local session as the primary header; relay calls also carry the
/// directory bearer so the relay can authorize the route.
fn local_session_auth(
    strategy: &'static str,
    token: &SecretString,
    request: &ResolveRequest<'_>,
) -> Option<ResolvedAuth> {
    let credential = Credential::LocalSession {
        token: token.clone(),
    };
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer_value(strategy, &credential)?);

    let mut secondary_bearer = false;
    if request.class != AddressClass::DirectAddress {
        let bearer = request
            .credentials
            .directory_bearer()
            .map(|token| Credential::DirectoryBearer { token });
        if let Some(value) = bearer.as_ref().and_then(|b| bearer_value(strategy, b)) {
            headers.insert(HeaderName::from_static(DIRECTORY_AUTH_HEADER), value);
            secondary_bearer = true;
        }
    }

    Some(ResolvedAuth {
        headers,
        kind: credential.kind(),
        strategy,
        secondary_bearer,
    })
}

fn bearer_value(strategy: &'static str, credential: &Credential) -> Option<HeaderValue> {
    let raw = format!("Bearer {}", credential.token().expose_secret().trim());
    match HeaderValue::from_str(&raw) {
        Ok(mut value) => {
            value.set_sensitive(true);
            Some(value)
        }
        Err(_) => {
            warn!(strategy, kind = %credential.kind(), "credential is not a valid header value, skipping");
            None
        }
    }
}

/// Ordered chain of resolution strategies.
#[derive(Debug)]
pub struct Resolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl Default for Resolver {
    /// Site session, default session, directory bearer, passthrough.
    fn default() -> Self {
        Self::new(vec![
            Box::new(SiteSession),
            Box::new(DefaultSession),
            Box::new(DirectoryBearer),
            Box::new(Passthrough),
        ])
    }
}

impl Resolver {
    pub fn new(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy in order; no hit yields [`ResolvedAuth::anonymous`].
    pub fn resolve(
        &self,
        identifier: &str,
        class: AddressClass,
        credentials: &CredentialStore,
    ) -> ResolvedAuth {
        let request = ResolveRequest {
            identifier,
            class,
            credentials,
        };
        self.strategies
            .iter()
            .find_map(|s| s.resolve(&request))
            .unwrap_or_else(ResolvedAuth::anonymous)
    }
}
