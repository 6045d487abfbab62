//! Error types for the `voxrelay` core library.

use thiserror::Error;

/// Result type alias using the core `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `voxrelay` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Stream event payload could not be decoded
    #[error("Failed to decode stream event: {0}")]
    StreamDecode(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
