//! Seams between the agent and the network.
//!
//! The sync and telemetry crates only see these traits, so tests can swap in
//! fakes and mocks for the HTTP client.

use crate::error::Result;
use crate::types::{PlaylistFetch, RegistrationRequest, RegistrationResponse};
use async_trait::async_trait;
use marquee_core::{HeartbeatEvent, PlaybackEvent};
use std::path::Path;

/// The Player API as seen by the agent.
#[async_trait]
pub trait PlayerApi: Send + Sync {
    /// `POST /register`
    async fn register(&self, request: &RegistrationRequest) -> Result<RegistrationResponse>;

    /// `GET /playlist?config_hash=<hash>`
    async fn fetch_playlist(&self, token: &str, config_hash: Option<&str>) -> Result<PlaylistFetch>;

    /// `POST /events/playbacks`
    async fn send_playback(&self, token: &str, event: &PlaybackEvent) -> Result<()>;

    /// `POST /heartbeat`
    async fn send_heartbeat(&self, token: &str, event: &HeartbeatEvent) -> Result<()>;
}

/// Fetches remote media into a local file.
#[async_trait]
pub trait AssetDownloader: Send + Sync {
    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// On error `dest` is left untouched.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}
