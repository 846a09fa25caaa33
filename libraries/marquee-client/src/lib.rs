//! Marquee Player API Client
//!
//! HTTP client library for the Player API the on-device agent talks to.
//!
//! # Features
//!
//! - **Registration**: first-run device provisioning
//! - **Playlist sync**: conditional fetch keyed by `config_hash` (304 aware)
//! - **Telemetry**: playback event and heartbeat delivery
//! - **Download**: streaming media download with atomic placement
//!
//! The [`PlayerApi`] and [`AssetDownloader`] traits are the seams the rest of
//! the agent depends on; [`PlayerApiClient`] implements both over `reqwest`.
//!
//! # Example
//!
//! ```ignore
//! use marquee_client::{ClientConfig, PlayerApi, PlayerApiClient, RegistrationRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PlayerApiClient::new(ClientConfig::new("https://player.example.com/api"))?;
//!
//!     let registration = client
//!         .register(&RegistrationRequest {
//!             serial_number: "SN-0042".into(),
//!             screen_id: "lobby-1".into(),
//!             provisioning_code: None,
//!         })
//!         .await?;
//!
//!     let token = format!("{}:{}", registration.player_id, registration.auth_token);
//!     let playlist = client.fetch_playlist(&token, None).await?;
//!     println!("{:?}", playlist);
//!     Ok(())
//! }
//! ```

mod api;
mod client;
mod download;
mod error;
mod playlist;
mod register;
mod telemetry;
mod types;

// Re-export main types
pub use api::{AssetDownloader, PlayerApi};
pub use client::PlayerApiClient;
pub use error::{ClientError, Result};
pub use types::{ClientConfig, PlaylistFetch, RegistrationRequest, RegistrationResponse};

// Re-export sub-clients for direct use if needed
pub use download::DownloadClient;
pub use playlist::PlaylistClient;
pub use register::RegistrationClient;
pub use telemetry::TelemetryClient;
