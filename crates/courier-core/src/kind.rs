//! Message kind taxonomy and classification
//!
//! Maps the variant-rich inbound event onto a stable, enumerated kind used
//! as the `Type` tag of every webhook payload. Classification is total and
//! deterministic; every event maps to exactly one kind.

use crate::event::{MessageContent, MessageEvent};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Link detector shared by the classifier and the payload builder so both
/// arrive at the same decision for the same text.
pub static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("link regex is valid"));

/// Canonical message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    VoiceMessage,
    AudioMessage,
    ImageMessage,
    VideoMessage,
    DocumentMessage,
    StickerMessage,
    ContactMessage,
    LocationMessage,
    LiveLocationMessage,
    ListMessage,
    Order,
    Payment,
    PollMessage,
    ReactionMessage,
    LinkMessage,
    TextMessage,
    Unknown,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoiceMessage => "voice_message",
            Self::AudioMessage => "audio_message",
            Self::ImageMessage => "image_message",
            Self::VideoMessage => "video_message",
            Self::DocumentMessage => "document_message",
            Self::StickerMessage => "sticker_message",
            Self::ContactMessage => "contact_message",
            Self::LocationMessage => "location_message",
            Self::LiveLocationMessage => "live_location_message",
            Self::ListMessage => "list_message",
            Self::Order => "order",
            Self::Payment => "payment",
            Self::PollMessage => "poll_message",
            Self::ReactionMessage => "reaction_message",
            Self::LinkMessage => "link_message",
            Self::TextMessage => "text_message",
            Self::Unknown => "unknown",
        }
    }

    /// Media-bearing kinds whose payload carries a local file path
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::VoiceMessage
                | Self::AudioMessage
                | Self::ImageMessage
                | Self::VideoMessage
                | Self::DocumentMessage
                | Self::StickerMessage
        )
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the canonical kind for one inbound event.
///
/// The arm order mirrors the upstream precedence: media variants first,
/// contacts ahead of the remaining media shapes (multi-contact payloads
/// never populate a single-contact field, so they get their own arm), then
/// structured content, polls, reactions, and finally text with link
/// detection over the resolved body.
pub fn classify(event: &MessageEvent) -> MessageKind {
    match &event.content {
        MessageContent::Audio(audio) => {
            if audio.ptt {
                MessageKind::VoiceMessage
            } else {
                MessageKind::AudioMessage
            }
        }
        MessageContent::ContactsArray(_) | MessageContent::Contact(_) => {
            MessageKind::ContactMessage
        }
        MessageContent::Image(_) => MessageKind::ImageMessage,
        MessageContent::Video(_) => MessageKind::VideoMessage,
        MessageContent::Document(_) => MessageKind::DocumentMessage,
        MessageContent::Sticker(_) => MessageKind::StickerMessage,
        MessageContent::Location(_) => MessageKind::LocationMessage,
        MessageContent::LiveLocation(_) => MessageKind::LiveLocationMessage,
        MessageContent::List(_) => MessageKind::ListMessage,
        MessageContent::Order(_) => MessageKind::Order,
        MessageContent::PaymentInvite(_) => MessageKind::Payment,
        MessageContent::PollCreation(_) | MessageContent::PollUpdate(_) => {
            MessageKind::PollMessage
        }
        MessageContent::Reaction(_) => MessageKind::ReactionMessage,
        MessageContent::Text(_) | MessageContent::ExtendedText(_) => {
            if LINK_RE.is_match(event.resolved_text()) {
                MessageKind::LinkMessage
            } else {
                MessageKind::TextMessage
            }
        }
        MessageContent::Unknown => MessageKind::Unknown,
    }
}
