//! Marquee Core
//!
//! Platform-agnostic data model shared by every crate of the Marquee player agent.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `DeviceIdentity`, `Playlist`, `CreativeRef`, `PlaybackEvent`,
//!   `HeartbeatEvent`
//! - **Media helpers**: media type inference from URLs and the local asset validity predicate
//! - **Error Handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use marquee_core::{CreativeRef, MediaType, Playlist};
//!
//! let mut creative = CreativeRef::new("c-1", "https://cdn.example.com/spot.MP4", 15);
//! creative.resolve_media_type();
//! assert_eq!(creative.media_type, Some(MediaType::Video));
//!
//! let playlist = Playlist::fallback();
//! assert_eq!(playlist.items.len(), 1);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod media;
pub mod types;

pub use error::{CoreError, Result};
pub use media::{infer_media_type, is_valid, url_extension};
pub use types::{
    CreativeRef, DeviceIdentity, DeviceMetrics, HeartbeatEvent, Location, MediaType,
    PlaybackEvent, PlaybackStatus, Playlist, FALLBACK_CREATIVE_ID, FALLBACK_DURATION_SECS,
};
