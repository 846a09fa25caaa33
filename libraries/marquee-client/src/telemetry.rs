//! Playback event and heartbeat delivery.

use crate::error::{ClientError, Result};
use marquee_core::{HeartbeatEvent, PlaybackEvent};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// Telemetry client for the Player API.
pub struct TelemetryClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    token: &'a str,
}

impl<'a> TelemetryClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, token: &'a str) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    /// Report one playback attempt.
    pub async fn send_playback(&self, event: &PlaybackEvent) -> Result<()> {
        self.post("events/playbacks", event).await
    }

    /// Report one heartbeat.
    pub async fn send_heartbeat(&self, event: &HeartbeatEvent) -> Result<()> {
        self.post("heartbeat", event).await
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.token)
            .json(body)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let status = response.status();
        if status.is_success() {
            debug!(url = %url, status = %status, "Telemetry delivered");
            Ok(())
        } else {
            Err(ClientError::from_response(response).await)
        }
    }
}
