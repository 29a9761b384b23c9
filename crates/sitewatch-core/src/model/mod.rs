// ── Domain model ──

pub mod device;
pub mod site;
pub mod snapshot;

pub use device::{Device, DeviceStatus};
pub use site::{AccessRole, HealthState, Site};
pub use snapshot::{PollStatus, SitePoll, Snapshot};
