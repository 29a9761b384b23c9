// sitewatch-api: routing, credential resolution, and relay transport for
// remote video-management sites.

pub mod auth;
pub mod error;
pub mod fleet;
pub mod models;
pub mod relay;
pub mod route;
pub mod transport;

pub use auth::{CredentialKind, CredentialStore, ResolvedAuth, Resolver};
pub use error::Error;
pub use fleet::{FleetClient, Plan};
pub use models::{DeviceRecord, RemoteEvent, SystemRecord};
pub use relay::{RawReply, RelayClient, Reply, SiteRef};
pub use route::{AddressClass, Endpoints, LocalSite, Route, Router, RoutingConfig};
pub use transport::{TlsMode, TransportConfig};
