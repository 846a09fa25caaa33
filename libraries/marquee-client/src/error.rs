//! Error types for the Player API client.

use thiserror::Error;

/// Errors that can occur when talking to the Player API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Bearer token rejected
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server answered 2xx with nothing in the body where content was required
    #[error("Empty response body from {0}")]
    EmptyBody(String),

    /// IO error while writing a download
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server is offline, unreachable or too slow
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl ClientError {
    /// Classify a transport failure.
    pub(crate) fn from_send(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ClientError::ServerUnreachable(e.to_string())
        } else {
            ClientError::Request(e)
        }
    }

    /// Build the error for a non-success response, consuming its body as the message.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 {
            ClientError::AuthFailed(error_text)
        } else {
            ClientError::ServerError {
                status: status.as_u16(),
                message: error_text,
            }
        }
    }

    /// Whether retrying later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::ServerUnreachable(_) | ClientError::Request(_) | ClientError::Io(_) => {
                true
            }
            ClientError::ServerError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
