// Fleet client
//
// Ties the router, the credential resolver, and the relay client into one
// call path: classify the identifier, build the URL, pick the credential,
// send. Endpoint groups live in sibling files as inherent methods.

mod devices;
mod directory;

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::auth::{CredentialStore, ResolvedAuth, Resolver};
use crate::error::Error;
use crate::relay::{RawReply, RelayClient, Reply, SiteRef};
use crate::route::{Route, Router};

/// How a call to a site would be made: where, and with which credential.
#[derive(Debug, Clone)]
pub struct Plan {
    pub route: Route,
    pub auth: ResolvedAuth,
}

/// Routed, authenticated access to every site in the fleet.
#[derive(Debug, Clone)]
pub struct FleetClient {
    router: Router,
    resolver: Arc<Resolver>,
    credentials: Arc<CredentialStore>,
    relay: RelayClient,
}

impl FleetClient {
    pub fn new(router: Router, credentials: Arc<CredentialStore>, relay: RelayClient) -> Self {
        Self {
            router,
            resolver: Arc::new(Resolver::default()),
            credentials,
            relay,
        }
    }

    /// Replace the default resolution chain.
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    /// Route and resolve without sending anything.
    pub fn plan(&self, identifier: &str, path: &str, query: &[(&str, &str)]) -> Result<Plan, Error> {
        let route = self.router.route(identifier, path, query)?;
        let auth = self
            .resolver
            .resolve(identifier, route.class, &self.credentials);
        Ok(Plan { route, auth })
    }

    /// Call `path` on `site` and normalize the outcome.
    pub async fn request(
        &self,
        site: &SiteRef,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Reply, Error> {
        let plan = self.plan(&site.id, path, query)?;
        debug!(
            site = %site.id,
            class = %plan.route.class,
            credential = %plan.auth.kind,
            strategy = plan.auth.strategy,
            "dispatching"
        );
        self.relay
            .call(site, method, plan.route.url, &plan.auth.headers, body)
            .await
    }

    /// Raw variant of [`request`](Self::request): status, headers and body
    /// come back untouched.
    pub async fn request_raw(
        &self,
        site: &SiteRef,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<RawReply, Error> {
        let plan = self.plan(&site.id, path, query)?;
        self.relay
            .call_raw(site, method, plan.route.url, &plan.auth.headers, body)
            .await
    }
}
