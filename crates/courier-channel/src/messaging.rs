//! Messaging operations
//!
//! Validates and forwards chat-side requests through the transport seam:
//! reply-aware text sends, typing/recording presence with optional
//! auto-pause, read receipts, and message revocation.

use crate::{ChannelError, Result};
use courier_core::jid::Jid;
use courier_core::traits::{ChatTransport, PresenceKind, ReplySpec};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A request to send a text message, optionally as a reply.
#[derive(Debug, Clone, Default)]
pub struct SendTextRequest {
    /// Destination chat, either a phone number or a full JID.
    pub chat: String,
    pub message: String,
    /// ID of the message being replied to.
    pub reply_to: Option<String>,
    /// Author of the replied message. Required for replies in group chats,
    /// where the chat JID alone does not identify the author.
    pub reply_participant: Option<String>,
}

pub struct MessageService {
    transport: Arc<dyn ChatTransport>,
}

impl MessageService {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    fn ensure_connected(&self) -> Result<()> {
        if !self.transport.is_connected() || !self.transport.is_logged_in() {
            return Err(ChannelError::NotConnected);
        }
        Ok(())
    }

    /// Send a text message, returning the transport-assigned message ID.
    pub async fn send_text(&self, request: &SendTextRequest) -> Result<String> {
        self.ensure_connected()?;
        if request.message.is_empty() {
            return Err(ChannelError::InvalidRequest("message is required".to_string()));
        }
        let chat = Jid::parse(&request.chat)?;

        let reply = match &request.reply_to {
            Some(replied_id) => {
                let participant = match &request.reply_participant {
                    Some(raw) => Jid::parse(raw)?,
                    None if chat.is_group() => {
                        return Err(ChannelError::InvalidRequest(
                            "reply in a group chat requires the participant JID".to_string(),
                        ));
                    }
                    None => chat.clone(),
                };
                Some(ReplySpec {
                    message_id: replied_id.clone(),
                    participant,
                })
            }
            None => None,
        };

        let id = self
            .transport
            .send_text(&chat, &request.message, reply.as_ref())
            .await?;
        info!(chat = %chat, message_id = %id, "Message sent");
        Ok(id)
    }

    /// Publish a presence state to a chat.
    ///
    /// When `pause_after` is given, a detached task publishes
    /// [`PresenceKind::Paused`] once the interval elapses, so callers do not
    /// need to remember to stop a typing indicator themselves.
    pub async fn send_presence(
        &self,
        chat: &str,
        kind: PresenceKind,
        pause_after: Option<Duration>,
    ) -> Result<()> {
        self.ensure_connected()?;
        let chat = Jid::parse(chat)?;
        self.transport.send_presence(&chat, kind).await?;

        if let Some(delay) = pause_after {
            if kind != PresenceKind::Paused {
                let transport = Arc::clone(&self.transport);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Err(e) = transport.send_presence(&chat, PresenceKind::Paused).await {
                        warn!(chat = %chat, error = %e.0, "Failed to auto-pause presence");
                    }
                });
            }
        }
        Ok(())
    }

    /// Mark a message as read (or played, for voice messages).
    pub async fn mark_read(
        &self,
        chat: &str,
        message_id: &str,
        sender: Option<&str>,
        played: bool,
    ) -> Result<()> {
        self.ensure_connected()?;
        if message_id.is_empty() {
            return Err(ChannelError::InvalidRequest("message_id is required".to_string()));
        }
        let chat = Jid::parse(chat)?;
        let sender = match sender {
            Some(raw) => Some(Jid::parse(raw)?),
            None if chat.is_group() => {
                return Err(ChannelError::InvalidRequest(
                    "marking a group message read requires the sender JID".to_string(),
                ));
            }
            None => None,
        };

        self.transport
            .mark_read(&chat, sender.as_ref(), message_id, played)
            .await?;
        info!(chat = %chat, message_id, played, "Receipt sent");
        Ok(())
    }

    /// Revoke a previously sent message for all chat members.
    pub async fn revoke(&self, chat: &str, message_id: &str) -> Result<()> {
        self.ensure_connected()?;
        if message_id.is_empty() {
            return Err(ChannelError::InvalidRequest("message_id is required".to_string()));
        }
        let chat = Jid::parse(chat)?;

        self.transport
            .revoke_message(&chat, message_id)
            .await
            .map_err(|e| {
                // The protocol refuses revocation of old or foreign messages;
                // surface that as a request problem, not a transport outage.
                if e.0.contains("too old") || e.0.contains("not allowed") {
                    ChannelError::InvalidRequest(e.0)
                } else {
                    ChannelError::Transport(e.0)
                }
            })?;
        info!(chat = %chat, message_id, "Message revoked");
        Ok(())
    }
}
