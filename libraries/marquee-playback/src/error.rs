//! Error types for playback scheduling

use marquee_telemetry::TelemetryError;
use thiserror::Error;

/// Failure reported by a rendering surface for one creative
#[derive(Debug, Error)]
pub enum RenderError {
    /// The surface cannot display this kind of media
    #[error("Unsupported media: {0}")]
    Unsupported(String),

    /// Display started but did not complete
    #[error("Render failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Event could not be queued for delivery
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
