//! Marquee Sync
//!
//! Everything that turns server state into something the screen can show:
//!
//! - [`DeviceRegistrar`]: one-time identity acquisition
//! - [`AssetCache`]: remote creative URLs → validated local files
//! - [`PlaylistSynchronizer`]: conditional playlist fetch with a guaranteed non-empty result

mod cache;
mod error;
mod registrar;
mod synchronizer;

// Public exports
pub use cache::{AssetCache, RepairReport};
pub use error::{Result, SyncError};
pub use registrar::{DeviceRegistrar, Provisioning};
pub use synchronizer::{PlaylistSynchronizer, SyncOutcome, SyncResult};
