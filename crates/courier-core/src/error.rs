//! Core error types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

/// Errors shared across the courier crates
#[derive(Error, Debug)]
pub enum CoreError {
    /// Chat identity could not be parsed
    #[error("Invalid JID: {0}")]
    InvalidJid(String),

    /// A required field was missing from a request or event
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// Media content type is not supported
    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),
}
