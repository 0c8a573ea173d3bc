//! Collaborator traits
//!
//! Seams to the subsystems this core consumes but does not implement: media
//! extraction, group metadata lookup, and the real-time protocol client.
//! Everything is injected as `Arc<dyn _>` so handlers stay testable with
//! hand-written fakes.

use crate::event::MediaRef;
use crate::jid::Jid;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Media extraction failure
#[derive(Error, Debug)]
#[error("Media extraction failed: {0}")]
pub struct MediaError(pub String);

/// Turns an inline media reference into a locally stored file.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Download and decrypt `media` into `dest_dir`, returning the stored
    /// file's path.
    async fn extract(&self, dest_dir: &Path, media: &MediaRef) -> Result<PathBuf, MediaError>;
}

/// Group metadata lookup failure
#[derive(Error, Debug)]
#[error("Group lookup failed: {0}")]
pub struct GroupLookupError(pub String);

/// Resolves group display names.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Look up the display name of a group chat. `Ok(None)` means the group
    /// exists but has no name set.
    async fn group_name(&self, group: &Jid) -> Result<Option<String>, GroupLookupError>;
}

/// Transport-level failure reported by the protocol client
#[derive(Error, Debug)]
#[error("Transport error: {0}")]
pub struct TransportError(pub String);

/// Chat presence indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceKind {
    Typing,
    Recording,
    Paused,
}

/// Quoted-reply target for an outbound message
#[derive(Debug, Clone)]
pub struct ReplySpec {
    /// ID of the message being replied to
    pub message_id: String,
    /// Original sender of the quoted message; in group chats this differs
    /// from the chat identity
    pub participant: Jid,
}

/// The real-time protocol client, as seen by this core.
///
/// Read-only with respect to connection internals: only status queries and
/// send/action calls are issued here.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn is_connected(&self) -> bool;

    fn is_logged_in(&self) -> bool;

    /// The authenticated client's own identity, when a session exists.
    fn own_jid(&self) -> Option<Jid>;

    async fn send_text(
        &self,
        chat: &Jid,
        text: &str,
        reply: Option<&ReplySpec>,
    ) -> Result<String, TransportError>;

    async fn send_presence(&self, chat: &Jid, kind: PresenceKind) -> Result<(), TransportError>;

    async fn reject_call(&self, caller: &Jid, call_id: &str) -> Result<(), TransportError>;

    async fn revoke_message(&self, chat: &Jid, message_id: &str) -> Result<(), TransportError>;

    async fn mark_read(
        &self,
        chat: &Jid,
        sender: Option<&Jid>,
        message_id: &str,
        played: bool,
    ) -> Result<(), TransportError>;
}
