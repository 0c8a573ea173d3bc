//! Inbound chat event model
//!
//! One inbound event carries exactly one content variant. The closed enum
//! makes the "exactly one populated variant" invariant hold by construction
//! instead of relying on nil-checks over twenty optional fields.

use crate::jid::Jid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque reference to an inline media item.
///
/// Only the media extraction collaborator interprets this; the pipeline
/// passes it through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Provider-side handle of the encrypted blob
    pub id: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
}

impl MediaRef {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            mime_type: None,
            size_bytes: None,
        }
    }

    pub fn with_mime(mut self, mime: &str) -> Self {
        self.mime_type = Some(mime.to_string());
        self
    }
}

/// Quoted-message context for replies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyContext {
    /// ID of the message being replied to
    pub replied_id: String,
    /// Text of the quoted message, when available
    pub quoted_text: Option<String>,
}

/// Metadata shared by every inbound event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Provider message ID
    pub id: String,
    /// Who sent the message
    pub sender: Jid,
    /// Where it was sent (individual contact or group)
    pub chat: Jid,
    /// Sender's display name
    pub push_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Message is viewable a single time by the recipient
    pub view_once: bool,
    /// Raw forwarding score; anything above zero means forwarded
    pub forwarding_score: u32,
    pub reply: Option<ReplyContext>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// Extended text with optional link preview metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedTextContent {
    pub text: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioContent {
    pub media: MediaRef,
    /// Recorded as a push-to-talk voice note rather than an uploaded file
    pub ptt: bool,
    pub duration_secs: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub media: MediaRef,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoContent {
    pub media: MediaRef,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentContent {
    pub media: MediaRef,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickerContent {
    pub media: MediaRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationContent {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveLocationContent {
    pub latitude: f64,
    pub longitude: f64,
    pub sequence: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListContent {
    pub title: String,
    pub description: Option<String>,
    pub button_text: Option<String>,
    pub sections: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderContent {
    pub order_id: String,
    pub item_count: u32,
    pub total_amount: Option<i64>,
    pub currency: Option<String>,
}

/// A single shared contact card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactCard {
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub vcard: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollVersion {
    V3,
    V4,
    V5,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollCreationContent {
    pub version: PollVersion,
    pub name: String,
    pub options: Vec<String>,
    pub selectable_count: u32,
}

/// A vote on an existing poll.
///
/// The selected options arrive encrypted; only the originating poll's ID is
/// available to this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollUpdateContent {
    pub poll_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionContent {
    /// The reaction emoji; empty means the reaction was removed
    pub text: String,
    /// ID of the message reacted to
    pub target_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInviteContent {
    pub service: Option<String>,
}

/// The content variants an inbound event can carry, exactly one per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessageContent {
    Text(TextContent),
    ExtendedText(ExtendedTextContent),
    Audio(AudioContent),
    Image(ImageContent),
    Video(VideoContent),
    Document(DocumentContent),
    Sticker(StickerContent),
    Location(LocationContent),
    LiveLocation(LiveLocationContent),
    List(ListContent),
    Order(OrderContent),
    Contact(ContactCard),
    ContactsArray(Vec<ContactCard>),
    PollCreation(PollCreationContent),
    PollUpdate(PollUpdateContent),
    Reaction(ReactionContent),
    PaymentInvite(PaymentInviteContent),
    Unknown,
}

/// One inbound chat event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub info: MessageInfo,
    pub content: MessageContent,
}

impl MessageEvent {
    /// The resolved plain-text body of the event, empty when the variant
    /// carries no text of its own.
    pub fn resolved_text(&self) -> &str {
        match &self.content {
            MessageContent::Text(t) => &t.text,
            MessageContent::ExtendedText(t) => &t.text,
            MessageContent::Image(i) => i.caption.as_deref().unwrap_or(""),
            MessageContent::Video(v) => v.caption.as_deref().unwrap_or(""),
            MessageContent::Reaction(r) => &r.text,
            _ => "",
        }
    }

    pub fn is_forwarded(&self) -> bool {
        self.info.forwarding_score > 0
    }

    pub fn is_group(&self) -> bool {
        self.info.chat.is_group()
    }
}
