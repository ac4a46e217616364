//! Error types for rusty-drive.

use thiserror::Error;

/// Result type alias for rusty-drive.
pub type Result<T> = std::result::Result<T, DriveError>;

/// Drive error types.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential loading or token exchange error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response from the Drive API.
    #[error("Drive API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Downloaded bytes are not valid UTF-8 text.
    #[error("Content is not valid UTF-8 text: {0}")]
    Decode(String),

    /// The Drive client was never initialized (missing or invalid credentials).
    #[error("Drive service not initialized")]
    NotInitialized,

    /// Uniform service-level error carrying the file ID context.
    #[error("Drive operation failed for '{file_id}': {message}")]
    Drive { file_id: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for DriveError {
    fn from(e: reqwest::Error) -> Self {
        DriveError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for DriveError {
    fn from(e: serde_json::Error) -> Self {
        DriveError::Serialization(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for DriveError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        DriveError::Auth(e.to_string())
    }
}
