/// Telemetry event types sent to the Player API
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one attempt to display a creative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Creative was rendered for its full duration
    Success,
    /// Rendering failed
    Error,
    /// Asset was not available locally, nothing rendered
    Skipped,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Success => write!(f, "success"),
            PlaybackStatus::Error => write!(f, "error"),
            PlaybackStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Geographic position of the device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Accuracy radius in meters, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// Record of one display attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    pub creative_id: String,
    pub screen_id: String,
    pub played_at: DateTime<Utc>,
    /// Seconds actually played
    pub duration: u64,
    pub status: PlaybackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Point-in-time device health sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetrics {
    /// CPU utilization since the previous sample, 0-100
    pub cpu_usage: f32,
    pub free_memory_bytes: u64,
    pub total_memory_bytes: u64,
    /// Whether the last exchange with the Player API succeeded
    pub online: bool,
}

/// Periodic health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatEvent {
    pub player_id: String,
    pub screen_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub software_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DeviceMetrics>,
}
