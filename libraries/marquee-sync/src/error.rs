use marquee_client::ClientError;
use marquee_core::CoreError;
use marquee_storage::StorageError;
use thiserror::Error;

/// Errors that can occur during registration and sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Registration failed: {0}")]
    Registration(#[source] ClientError),

    #[error("Invalid identity from server: {0}")]
    InvalidIdentity(#[from] CoreError),

    #[error("Download failed: {0}")]
    Download(#[source] ClientError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
