//! Webhook notification pipeline for chat-courier
//!
//! Turns one inbound chat event into a signed JSON payload and delivers it
//! to every configured subscriber URL:
//! - **Payload building**: normalized outbound payload from the classified
//!   event, with fail-fast media extraction
//! - **Signing**: HMAC-SHA256 over the exact serialized bytes
//!   (`X-Hub-Signature-256: sha256=<hex>`)
//! - **Delivery**: per-URL HTTP POST with bounded exponential backoff on
//!   transport failures
//! - **Deduplication**: a TTL-bounded guard cache for handlers that must be
//!   idempotent under at-least-once event delivery
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_webhook::{NotificationPipeline, PayloadBuilder, RetryConfig, WebhookDispatcher};
//! use std::sync::Arc;
//!
//! let dispatcher = Arc::new(WebhookDispatcher::new(
//!     vec!["https://example.com/hook".to_string()],
//!     "shared-secret",
//!     RetryConfig::default(),
//! )?);
//! let builder = PayloadBuilder::new(media, groups, "storages/media", 3000);
//! let pipeline = NotificationPipeline::new(builder, dispatcher);
//! pipeline.notify(&event).await?;
//! ```

pub mod dedup;
pub mod outbound;
pub mod payload;
pub mod pipeline;
pub mod signature;

pub use dedup::*;
pub use outbound::*;
pub use payload::*;
pub use pipeline::*;
pub use signature::*;

use thiserror::Error;

/// Webhook errors
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Invalid JID: {0}")]
    InvalidJid(String),

    #[error("Failed to extract media: {0}")]
    MediaExtraction(String),

    #[error("Invalid webhook URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to serialize payload: {0}")]
    Serialization(String),

    #[error("Delivery failed after {attempts} attempts: {last_error}")]
    DeliveryFailed { attempts: u32, last_error: String },
}

pub type Result<T, E = WebhookError> = std::result::Result<T, E>;
