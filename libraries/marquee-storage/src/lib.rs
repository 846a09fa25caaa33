//! Marquee Storage
//!
//! Durable key → JSON document storage for the player agent.
//!
//! Every piece of state the agent needs to survive a restart (device identity,
//! cached playlist, pending telemetry) lives here as one JSON document per key.
//!
//! # Architecture
//!
//! - **Pluggable backends**: `FileBackend` writes one file per key with atomic replace,
//!   `MemoryBackend` serves hosts without durable storage
//! - **Corruption tolerant**: unreadable or malformed documents read as absent, never as errors
//! - **Queue accessors**: `get_list` always yields a vector, resetting corrupt documents
//!
//! # Example
//!
//! ```rust,no_run
//! use marquee_storage::{keys, PersistentStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PersistentStore::file("/var/lib/marquee/state");
//!
//! store.set("greeting", &"hello").await?;
//! let value: Option<String> = store.get("greeting").await;
//!
//! let pending: Vec<serde_json::Value> = store.get_list(keys::PENDING_PLAYBACKS).await;
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use error::{Result, StorageError};
pub use store::PersistentStore;

/// Well-known document keys
pub mod keys {
    /// Identity acquired at registration
    pub const DEVICE_IDENTITY: &str = "device_identity";
    /// Last resolved and localized playlist
    pub const PLAYLIST: &str = "playlist";
    /// Playback events awaiting delivery
    pub const PENDING_PLAYBACKS: &str = "pending_playbacks";
    /// Heartbeats awaiting delivery
    pub const PENDING_HEARTBEATS: &str = "pending_heartbeats";
}
