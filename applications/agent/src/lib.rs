//! Marquee Agent Library
//!
//! Digital signage player agent: registers the device, keeps its playlist and
//! media in sync, plays creatives on a loop and reports playback and health.
//!
//! This library exposes the agent components for testing purposes.

pub mod agent;
pub mod config;
pub mod error;

pub use agent::{Agent, PlaylistSummary, StatusReport};
pub use config::{AgentConfig, StorageKind};
pub use error::{AgentError, Result};
