//! Device registration against the Player API.

use crate::error::{ClientError, Result};
use crate::types::{RegistrationRequest, RegistrationResponse};
use reqwest::Client;
use tracing::{debug, info, warn};

/// Registration client for the Player API.
pub struct RegistrationClient<'a> {
    http: &'a Client,
    base_url: &'a str,
}

impl<'a> RegistrationClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str) -> Self {
        Self { http, base_url }
    }

    /// Register this device.
    ///
    /// Returns the server-issued player id and auth token on success.
    pub async fn register(&self, request: &RegistrationRequest) -> Result<RegistrationResponse> {
        let url = format!("{}/register", self.base_url);
        debug!(
            url = %url,
            serial_number = %request.serial_number,
            screen_id = %request.screen_id,
            "Registering device"
        );

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let status = response.status();

        if status.is_success() {
            let registration: RegistrationResponse = response.json().await.map_err(|e| {
                ClientError::ParseError(format!("Failed to parse registration response: {}", e))
            })?;

            info!(
                player_id = %registration.player_id,
                screen_id = %registration.screen_id,
                "Device registered"
            );

            Ok(registration)
        } else {
            warn!(status = %status, "Registration rejected");
            Err(ClientError::from_response(response).await)
        }
    }
}
