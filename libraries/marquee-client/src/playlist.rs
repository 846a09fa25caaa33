//! Conditional playlist fetch.

use crate::error::{ClientError, Result};
use crate::types::PlaylistFetch;
use marquee_core::Playlist;
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Playlist client for the Player API.
pub struct PlaylistClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    token: &'a str,
}

impl<'a> PlaylistClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, token: &'a str) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    /// Fetch the screen's playlist, passing the last known revision.
    ///
    /// The server answers 304 when `config_hash` is still current.
    pub async fn fetch(&self, config_hash: Option<&str>) -> Result<PlaylistFetch> {
        let url = format!("{}/playlist", self.base_url);
        debug!(url = %url, config_hash = ?config_hash, "Fetching playlist");

        let mut request = self.http.get(&url).bearer_auth(self.token);
        if let Some(hash) = config_hash {
            request = request.query(&[("config_hash", hash)]);
        }

        let response = request.send().await.map_err(ClientError::from_send)?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            debug!("Playlist unchanged");
            return Ok(PlaylistFetch::Unchanged);
        }

        if !status.is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let playlist: Playlist = response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse playlist: {}", e))
        })?;

        debug!(
            config_hash = ?playlist.config_hash,
            items = playlist.items.len(),
            "Playlist received"
        );

        Ok(PlaylistFetch::Updated(playlist))
    }
}
