// Request routing
//
// Classifies a site identifier into one of three address classes and
// builds the fully-qualified target URL for an endpoint path. Classification
// is a pure function of the identifier string and the statically configured
// local site; it never fails.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

use crate::error::Error;

/// Reserved identifier meaning "the directory of all sites".
pub const DEFAULT_GLOBAL_ALIAS: &str = "all";
pub const DEFAULT_DIRECTORY_URL: &str = "https://directory.sitewatch.dev";
pub const DEFAULT_RELAY_DOMAIN: &str = "relay.sitewatch.dev";

/// Routing category of a site identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressClass {
    /// The reserved wildcard: calls go to the global directory host.
    GlobalAlias,
    /// The identifier is itself reachable (`localhost`, IPv4, `host:port`),
    /// or names the configured local site.
    DirectAddress,
    /// Anything else. Reached through `<identifier>.<relay-domain>`.
    RelayIdentifier,
}

impl AddressClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GlobalAlias => "global",
            Self::DirectAddress => "direct",
            Self::RelayIdentifier => "relay",
        }
    }
}

impl std::fmt::Display for AddressClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one site served from a local-network server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSite {
    pub id: String,
    /// `host` or `host:port` of the local server.
    pub host: String,
}

/// Endpoint paths used by the fleet client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Per-site "system info" path. Rewritten for the global alias.
    pub system_info: String,
    /// Directory path listing all systems.
    pub directory_systems: String,
    /// Per-site device inventory.
    pub devices: String,
    /// Per-site generic event ingestion.
    pub events: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            system_info: "/rest/v3/system/info".into(),
            directory_systems: "/cdb/systems".into(),
            devices: "/rest/v3/devices".into(),
            events: "/rest/v3/events/generic".into(),
        }
    }
}

/// Static routing configuration.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub global_alias: String,
    /// Base URL of the global directory.
    pub directory_url: Url,
    /// Relay hosts are built as `<identifier>.<relay_domain>`.
    pub relay_domain: String,
    pub local_site: Option<LocalSite>,
    pub endpoints: Endpoints,
}

impl RoutingConfig {
    /// Default alias, relay domain and endpoints around `directory_url`.
    pub fn new(directory_url: Url) -> Self {
        Self {
            global_alias: DEFAULT_GLOBAL_ALIAS.into(),
            directory_url,
            relay_domain: DEFAULT_RELAY_DOMAIN.into(),
            local_site: None,
            endpoints: Endpoints::default(),
        }
    }
}

/// A resolved target: the class it was routed by and the final URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub class: AddressClass,
    pub url: Url,
}

// ── Classification ───────────────────────────────────────────────────

/// Strip whitespace and the `{}` wrapping commonly used around identifiers.
pub fn normalize_identifier(identifier: &str) -> &str {
    identifier
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
}

/// Classify a site identifier.
///
/// Identifiers matching none of the explicit rules become
/// [`AddressClass::RelayIdentifier`], including malformed ones.
pub fn classify(identifier: &str, global_alias: &str, local: Option<&LocalSite>) -> AddressClass {
    let id = normalize_identifier(identifier);

    if id.eq_ignore_ascii_case(normalize_identifier(global_alias)) {
        return AddressClass::GlobalAlias;
    }
    if is_network_address(id) || is_local_site(id, local) {
        return AddressClass::DirectAddress;
    }
    AddressClass::RelayIdentifier
}

fn is_network_address(id: &str) -> bool {
    id.eq_ignore_ascii_case("localhost") || id.contains(':') || id.parse::<Ipv4Addr>().is_ok()
}

fn is_local_site(id: &str, local: Option<&LocalSite>) -> bool {
    local.is_some_and(|l| !l.host.trim().is_empty() && normalize_identifier(&l.id) == id)
}

// ── Router ───────────────────────────────────────────────────────────

/// Classifies identifiers and builds target URLs from a [`RoutingConfig`].
#[derive(Debug, Clone)]
pub struct Router {
    config: RoutingConfig,
}

impl Router {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.config.endpoints
    }

    pub fn global_alias(&self) -> &str {
        &self.config.global_alias
    }

    pub fn classify(&self, identifier: &str) -> AddressClass {
        classify(
            identifier,
            &self.config.global_alias,
            self.config.local_site.as_ref(),
        )
    }

    /// Classify `identifier` and build the target URL for `path`.
    pub fn route(
        &self,
        identifier: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Route, Error> {
        let class = self.classify(identifier);
        let url = self.build_address(identifier, class, path, query)?;
        trace!(identifier, %class, %url, "routed");
        Ok(Route { class, url })
    }

    /// Build the target URL for an already-classified identifier.
    pub fn build_address(
        &self,
        identifier: &str,
        class: AddressClass,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Url, Error> {
        let id = normalize_identifier(identifier);
        let raw = match class {
            AddressClass::GlobalAlias => {
                // The directory has no per-site info endpoint; "system info"
                // against the alias means "list systems".
                let path = if same_path(path, &self.config.endpoints.system_info) {
                    self.config.endpoints.directory_systems.as_str()
                } else {
                    path
                };
                let base = self.config.directory_url.as_str().trim_end_matches('/');
                format!("{base}{}", rooted(path))
            }
            AddressClass::DirectAddress => {
                let host = self.direct_host(id);
                let scheme = direct_scheme(host);
                format!("{scheme}://{}{}", url_host(host), rooted(path))
            }
            AddressClass::RelayIdentifier => {
                let domain = self.config.relay_domain.trim_matches('.');
                format!("https://{id}.{domain}{}", rooted(path))
            }
        };

        let mut url = Url::parse(&raw)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// The configured local host when `id` names the local site, otherwise
    /// `id` itself.
    fn direct_host<'a>(&'a self, id: &'a str) -> &'a str {
        match &self.config.local_site {
            Some(local) if !is_network_address(id) && normalize_identifier(&local.id) == id => {
                local.host.trim()
            }
            _ => id,
        }
    }
}

fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

fn same_path(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

/// Split `host[:port]`, handling bracketed and bare IPv6 literals.
fn split_host_port(host: &str) -> (&str, Option<u16>) {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((addr, tail)) => (addr, tail.strip_prefix(':').and_then(|p| p.parse().ok())),
            None => (host, None),
        };
    }
    if host.matches(':').count() > 1 {
        // Bare IPv6 literal, no port.
        return (host, None);
    }
    match host.rsplit_once(':') {
        Some((name, port)) => match port.parse() {
            Ok(port) => (name, Some(port)),
            Err(_) => (host, None),
        },
        None => (host, None),
    }
}

fn is_loopback(name: &str) -> bool {
    name.eq_ignore_ascii_case("localhost")
        || name.parse::<Ipv4Addr>().is_ok_and(|ip| ip.is_loopback())
}

/// Secure on the conventional secure port, plain on a port-less loopback,
/// secure otherwise.
fn direct_scheme(host: &str) -> &'static str {
    match split_host_port(host) {
        (_, Some(443)) => "https",
        (name, None) if is_loopback(name) => "http",
        _ => "https",
    }
}

/// Bare IPv6 literals need brackets inside a URL.
fn url_host(host: &str) -> String {
    if !host.starts_with('[') && host.matches(':').count() > 1 {
        format!("[{host}]")
    } else {
        host.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> RoutingConfig {
        RoutingConfig::new(Url::parse(DEFAULT_DIRECTORY_URL).expect("directory url"))
    }

    fn router() -> Router {
        Router::new(default_config())
    }

    fn router_with_local() -> Router {
        Router::new(RoutingConfig {
            local_site: Some(LocalSite {
                id: "{local-0001}".into(),
                host: "10.0.0.5:7001".into(),
            }),
            ..default_config()
        })
    }

    #[test]
    fn new_config_fills_defaults_around_directory() {
        let url = Url::parse("https://dir.example.test").expect("url");
        let cfg = RoutingConfig::new(url.clone());
        assert_eq!(cfg.directory_url, url);
        assert_eq!(cfg.global_alias, DEFAULT_GLOBAL_ALIAS);
        assert_eq!(cfg.relay_domain, DEFAULT_RELAY_DOMAIN);
        assert!(cfg.local_site.is_none());
        assert_eq!(cfg.endpoints.devices, "/rest/v3/devices");
    }

    #[test]
    fn global_alias_is_case_insensitive_and_unwrapped() {
        assert_eq!(classify("ALL", "all", None), AddressClass::GlobalAlias);
        assert_eq!(classify("{all}", "all", None), AddressClass::GlobalAlias);
        assert_eq!(classify(" All ", "all", None), AddressClass::GlobalAlias);
    }

    #[test]
    fn network_addresses_are_direct() {
        for id in ["localhost", "192.168.1.20", "192.168.1.20:7001", "nvr.lan:443", "::1"] {
            assert_eq!(
                classify(id, "all", None),
                AddressClass::DirectAddress,
                "{id}"
            );
        }
    }

    #[test]
    fn local_site_id_is_direct_only_with_a_host() {
        let local = LocalSite {
            id: "abc".into(),
            host: "10.0.0.5".into(),
        };
        assert_eq!(classify("{abc}", "all", Some(&local)), AddressClass::DirectAddress);

        let hostless = LocalSite {
            id: "abc".into(),
            host: String::new(),
        };
        assert_eq!(classify("abc", "all", Some(&hostless)), AddressClass::RelayIdentifier);
    }

    #[test]
    fn anything_else_falls_through_to_relay() {
        for id in ["3f1c7b2e-aaaa-bbbb-cccc-0123456789ab", "999.1.1.1", "not a host!", "x"] {
            assert_eq!(
                classify(id, "all", None),
                AddressClass::RelayIdentifier,
                "{id}"
            );
        }
    }

    #[test]
    fn classification_is_total() {
        let samples = ["", "{", "}", "{}", ":", "...", "a.b.c", "ALL:", "\u{1F600}"];
        for id in samples {
            let class = classify(id, "all", None);
            assert!(matches!(
                class,
                AddressClass::GlobalAlias
                    | AddressClass::DirectAddress
                    | AddressClass::RelayIdentifier
            ));
        }
    }

    #[test]
    fn global_alias_rewrites_system_info() {
        let router = router();
        let route = router.route("all", "/rest/v3/system/info", &[]).expect("route");
        assert_eq!(route.class, AddressClass::GlobalAlias);
        assert_eq!(route.url.as_str(), "https://directory.sitewatch.dev/cdb/systems");

        let other = router.route("all", "/cdb/oauth/summary", &[]).expect("route");
        assert_eq!(other.url.path(), "/cdb/oauth/summary");
    }

    #[test]
    fn direct_scheme_selection() {
        let router = router();
        let https = router.route("nvr.lan:443", "/rest/v3/devices", &[]).expect("route");
        assert_eq!(https.url.as_str(), "https://nvr.lan/rest/v3/devices");

        let plain = router.route("127.0.0.1", "/rest/v3/devices", &[]).expect("route");
        assert_eq!(plain.url.scheme(), "http");

        let loop_port = router.route("127.0.0.1:7001", "/x", &[]).expect("route");
        assert_eq!(loop_port.url.scheme(), "https");

        let lan = router.route("192.168.1.20", "/x", &[]).expect("route");
        assert_eq!(lan.url.scheme(), "https");
    }

    #[test]
    fn local_site_uses_configured_host() {
        let router = router_with_local();
        let route = router.route("local-0001", "rest/v3/devices", &[]).expect("route");
        assert_eq!(route.class, AddressClass::DirectAddress);
        assert_eq!(route.url.as_str(), "https://10.0.0.5:7001/rest/v3/devices");
    }

    #[test]
    fn relay_identifier_uses_subdomain_convention() {
        let router = router();
        let route = router
            .route("{3f1c7b2e-aaaa}", "/rest/v3/devices", &[("_with", "id,name")])
            .expect("route");
        assert_eq!(route.class, AddressClass::RelayIdentifier);
        assert_eq!(route.url.host_str(), Some("3f1c7b2e-aaaa.relay.sitewatch.dev"));
        assert_eq!(route.url.query(), Some("_with=id%2Cname"));
    }

    #[test]
    fn bare_ipv6_is_bracketed() {
        let router = router();
        let route = router.route("::1", "/x", &[]).expect("route");
        assert_eq!(route.url.host_str(), Some("[::1]"));
    }
}
