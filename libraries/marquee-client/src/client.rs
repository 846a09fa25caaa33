//! Main Player API client.

use crate::api::{AssetDownloader, PlayerApi};
use crate::download::DownloadClient;
use crate::error::{ClientError, Result};
use crate::playlist::PlaylistClient;
use crate::register::RegistrationClient;
use crate::telemetry::TelemetryClient;
use crate::types::{ClientConfig, PlaylistFetch, RegistrationRequest, RegistrationResponse};
use async_trait::async_trait;
use marquee_core::{HeartbeatEvent, PlaybackEvent};
use reqwest::Client;
use std::path::Path;

/// Client for the Player API.
///
/// Every request is bounded by the configured timeouts so one slow call cannot
/// starve the agent's other activities. Media downloads use a separate
/// connection pool with a longer overall timeout.
///
/// # Example
///
/// ```ignore
/// use marquee_client::{ClientConfig, PlayerApi, PlayerApiClient};
///
/// let client = PlayerApiClient::new(ClientConfig::new("https://player.example.com/api"))?;
/// let fetch = client.fetch_playlist("p1:secret", Some("abc123")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PlayerApiClient {
    http: Client,
    download_http: Client,
    base_url: String,
}

impl PlayerApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        // Validate URL
        if config.base_url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        // Parse and normalize URL
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let user_agent = format!("MarqueeAgent/{}", env!("CARGO_PKG_VERSION"));

        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(user_agent.clone())
            .build()?;

        let download_http = Client::builder()
            .timeout(config.download_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            http,
            download_http,
            base_url,
        })
    }

    /// Get the normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Registration operations.
    pub fn registration(&self) -> RegistrationClient<'_> {
        RegistrationClient::new(&self.http, &self.base_url)
    }

    /// Playlist operations for the given bearer token.
    pub fn playlist<'a>(&'a self, token: &'a str) -> PlaylistClient<'a> {
        PlaylistClient::new(&self.http, &self.base_url, token)
    }

    /// Telemetry operations for the given bearer token.
    pub fn telemetry<'a>(&'a self, token: &'a str) -> TelemetryClient<'a> {
        TelemetryClient::new(&self.http, &self.base_url, token)
    }

    /// Media download operations.
    pub fn downloads(&self) -> DownloadClient<'_> {
        DownloadClient::new(&self.download_http)
    }
}

#[async_trait]
impl PlayerApi for PlayerApiClient {
    async fn register(&self, request: &RegistrationRequest) -> Result<RegistrationResponse> {
        self.registration().register(request).await
    }

    async fn fetch_playlist(&self, token: &str, config_hash: Option<&str>) -> Result<PlaylistFetch> {
        self.playlist(token).fetch(config_hash).await
    }

    async fn send_playback(&self, token: &str, event: &PlaybackEvent) -> Result<()> {
        self.telemetry(token).send_playback(event).await
    }

    async fn send_heartbeat(&self, token: &str, event: &HeartbeatEvent) -> Result<()> {
        self.telemetry(token).send_heartbeat(event).await
    }
}

#[async_trait]
impl AssetDownloader for PlayerApiClient {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.downloads().download(url, dest).await
    }
}
