//! Error types for the map-picker location service.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by collaborators and infrastructure.
///
/// These never reach the bot platform directly: the resolver and pipeline
/// turn them into a [`crate::models::ResolutionFailure`].
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request to an external service exceeded its time budget
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Geocoder answered but could not produce an address
    #[error("Geocoder error: {0}")]
    Geocoder(String),

    /// Profile store rejected the write
    #[error("Profile store error: {0}")]
    ProfileStore(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map a reqwest error, keeping timeouts distinguishable.
    ///
    /// The URL is dropped: request URLs carry API keys.
    pub fn from_request(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Error::Timeout(timeout_secs)
        } else {
            Error::Http(err.without_url())
        }
    }
}
