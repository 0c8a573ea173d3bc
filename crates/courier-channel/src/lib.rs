//! Chat-side services for chat-courier
//!
//! Operations issued *towards* the chat network through the
//! [`courier_core::traits::ChatTransport`] seam: reply-aware sends, chat
//! presence, read receipts, message revocation, and call-ended handling
//! with duplicate suppression.

pub mod calls;
pub mod messaging;

pub use calls::*;
pub use messaging::*;

use courier_core::error::CoreError;
use courier_core::traits::TransportError;
use thiserror::Error;

/// Channel service errors
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Protocol client is not connected or not logged in
    #[error("Chat client not connected or logged in")]
    NotConnected,

    /// The request is missing or malformed input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid JID: {0}")]
    InvalidJid(String),

    /// The protocol client reported a failure
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl From<CoreError> for ChannelError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidJid(raw) => Self::InvalidJid(raw),
            other => Self::InvalidRequest(other.to_string()),
        }
    }
}

impl From<TransportError> for ChannelError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e.0)
    }
}

pub type Result<T, E = ChannelError> = std::result::Result<T, E>;
