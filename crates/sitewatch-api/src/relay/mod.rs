// Relay transport: the outbound HTTP call and its outcome normalization.

mod cache;
mod client;

pub use cache::ResponseCache;
pub(crate) use client::request_failed;
pub use client::{RawReply, RelayClient, Reply, SiteRef};
