//! Types for Player API requests and responses.

use marquee_core::Playlist;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the Player API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "https://player.example.com/api")
    pub base_url: String,
    /// Upper bound for JSON requests
    pub request_timeout: Duration,
    /// Upper bound for establishing a connection
    pub connect_timeout: Duration,
    /// Upper bound for a full media download
    pub download_timeout: Duration,
}

impl ClientConfig {
    /// Create a config with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(300),
        }
    }

    /// Override every timeout at once.
    pub fn with_timeouts(mut self, request: Duration, connect: Duration, download: Duration) -> Self {
        self.request_timeout = request;
        self.connect_timeout = connect;
        self.download_timeout = download;
        self
    }
}

/// Device provisioning data sent on first run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub serial_number: String,
    pub screen_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_code: Option<String>,
}

/// Identity handed out by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub player_id: String,
    pub auth_token: String,
    pub screen_id: String,
}

/// Result of a conditional playlist fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistFetch {
    /// Server sent a new revision
    Updated(Playlist),
    /// Server answered 304; keep the current playlist
    Unchanged,
}
