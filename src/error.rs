//! Error types for the drive_storage crate.

use thiserror::Error;

/// Errors that can occur when interacting with Google Drive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Fixed sentinel: a storage operation was invoked before `auth`.
    #[error("not authenticated: call auth() before issuing storage operations")]
    NotAuthenticated,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the Drive API; the message carries the remote
    /// error text verbatim.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT encoding error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("Invalid Drive URL or ID: {0}")]
    InvalidUrlOrId(String),
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
