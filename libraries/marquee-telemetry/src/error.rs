use marquee_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the telemetry layer
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Sensor sampling failures. Never fatal: providers keep their previous value.
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Sensor unavailable: {0}")]
    Unavailable(String),

    #[error("Sensor read failed: {0}")]
    Read(String),
}
