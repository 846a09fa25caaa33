/// Agent configuration
use crate::error::{AgentError, Result};
use marquee_client::ClientConfig;
use marquee_core::Location;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where persisted state lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// JSON documents under `<data_dir>/state`
    #[default]
    File,
    /// In-process only; nothing survives a restart and media is not cached
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub api_base_url: String,

    pub serial_number: String,

    pub screen_id: String,

    #[serde(default)]
    pub provisioning_code: Option<String>,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageKind,

    #[serde(default = "default_software_version")]
    pub software_version: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    #[serde(default = "default_location_interval_secs")]
    pub location_interval_secs: u64,

    #[serde(default = "default_playlist_sync_interval_secs")]
    pub playlist_sync_interval_secs: u64,

    /// Fixed position of the screen, if known
    #[serde(default)]
    pub location: Option<Location>,
}

impl AgentConfig {
    /// Load configuration from `path`, then apply `MARQUEE_*` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AgentError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("MARQUEE").try_parsing(true))
            .build()?;

        let config: AgentConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api_base_url).map_err(|e| {
            AgentError::Config(format!("Invalid api_base_url {:?}: {e}", self.api_base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AgentError::Config(format!(
                "api_base_url must be http or https, got {}",
                url.scheme()
            )));
        }

        if self.serial_number.trim().is_empty() {
            return Err(AgentError::Config("serial_number is required".to_string()));
        }
        if self.screen_id.trim().is_empty() {
            return Err(AgentError::Config("screen_id is required".to_string()));
        }

        for (name, value) in [
            ("request_timeout_secs", self.request_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("download_timeout_secs", self.download_timeout_secs),
            ("heartbeat_interval_secs", self.heartbeat_interval_secs),
            ("location_interval_secs", self.location_interval_secs),
            ("playlist_sync_interval_secs", self.playlist_sync_interval_secs),
        ] {
            if value == 0 {
                return Err(AgentError::Config(format!("{name} must be greater than 0")));
            }
        }

        if let Some(location) = &self.location {
            if !(-90.0..=90.0).contains(&location.latitude)
                || !(-180.0..=180.0).contains(&location.longitude)
            {
                return Err(AgentError::Config(format!(
                    "location out of range: {}, {}",
                    location.latitude, location.longitude
                )));
            }
        }

        Ok(())
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_base_url.clone()).with_timeouts(
            Duration::from_secs(self.request_timeout_secs),
            Duration::from_secs(self.connect_timeout_secs),
            Duration::from_secs(self.download_timeout_secs),
        )
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn location_interval(&self) -> Duration {
        Duration::from_secs(self.location_interval_secs)
    }

    pub fn playlist_sync_interval(&self) -> Duration {
        Duration::from_secs(self.playlist_sync_interval_secs)
    }
}

// Default values
fn default_data_dir() -> PathBuf {
    PathBuf::from("./marquee-data")
}

fn default_software_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_download_timeout_secs() -> u64 {
    300
}

fn default_heartbeat_interval_secs() -> u64 {
    60
}

fn default_location_interval_secs() -> u64 {
    30
}

fn default_playlist_sync_interval_secs() -> u64 {
    60
}
