//! Outbound payload model and builder
//!
//! Builds the normalized wire payload for one inbound event. Key names
//! follow the subscriber contract exactly, so the struct leans on serde
//! renames rather than idiomatic field casing.

use crate::{Result, WebhookError};
use courier_core::event::{
    ContactCard, ListContent, LiveLocationContent, LocationContent, MessageContent, MessageEvent,
    OrderContent,
};
use courier_core::jid::Jid;
use courier_core::kind::{classify, MessageKind, LINK_RE};
use courier_core::traits::{GroupDirectory, MediaExtractor};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

/// Nested `message` object of the payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(rename = "ID")]
    pub id: String,
    /// Text of the quoted message when this is a reply, empty otherwise
    #[serde(rename = "MessageOrigin")]
    pub message_origin: String,
    #[serde(rename = "RepliedId")]
    pub replied_id: String,
    #[serde(rename = "TextMessage")]
    pub text_message: String,
    #[serde(rename = "TitleLink", skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(rename = "LinkDescription", skip_serializing_if = "Option::is_none")]
    pub link_description: Option<String>,
    #[serde(rename = "PollUpdate", skip_serializing_if = "Option::is_none")]
    pub poll_update: Option<PollUpdateBody>,
}

/// Poll vote notification.
///
/// Selected options are opaque in the upstream payload and stay empty here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollUpdateBody {
    #[serde(rename = "PollID")]
    pub poll_id: String,
    #[serde(rename = "SelectedOptions")]
    pub selected_options: Vec<String>,
}

/// Reaction attached to a payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionBody {
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "ID")]
    pub target_id: String,
}

/// The normalized outbound payload posted to every subscriber URL.
///
/// Invariants: `Type` is always present and consistent with the populated
/// content key; at most one of the media path keys is set; `IsGroup` derives
/// solely from the chat identity's server suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "SenderNumber")]
    pub sender_number: String,
    #[serde(rename = "message")]
    pub message: MessageBody,
    #[serde(rename = "PushName", skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
    #[serde(rename = "reaction", skip_serializing_if = "Option::is_none")]
    pub reaction: Option<ReactionBody>,
    #[serde(rename = "view_once", skip_serializing_if = "Option::is_none")]
    pub view_once: Option<bool>,
    #[serde(rename = "forwarded", skip_serializing_if = "Option::is_none")]
    pub forwarded: Option<bool>,
    #[serde(rename = "timestamp")]
    pub timestamp: String,
    #[serde(rename = "IsGroup")]
    pub is_group: bool,
    #[serde(rename = "GroupName", skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(rename = "MyNumber")]
    pub my_number: bool,
    #[serde(rename = "Type")]
    pub kind: MessageKind,
    #[serde(rename = "Port")]
    pub port: u16,

    // At most one of these media path keys is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<PathBuf>,

    // Raw pass-through objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ListContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_location: Option<LiveLocationContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Vec<ContactCard>>,
}

/// Builds [`WebhookPayload`]s from inbound events.
pub struct PayloadBuilder {
    media: Arc<dyn MediaExtractor>,
    groups: Arc<dyn GroupDirectory>,
    media_dir: PathBuf,
    port: u16,
    own_jid: Option<Jid>,
}

impl PayloadBuilder {
    pub fn new(
        media: Arc<dyn MediaExtractor>,
        groups: Arc<dyn GroupDirectory>,
        media_dir: impl Into<PathBuf>,
        port: u16,
    ) -> Self {
        Self {
            media,
            groups,
            media_dir: media_dir.into(),
            port,
            own_jid: None,
        }
    }

    /// Identity of the authenticated client, used for the `MyNumber` flag.
    pub fn with_own_jid(mut self, jid: Jid) -> Self {
        self.own_jid = Some(jid);
        self
    }

    /// Build the outbound payload for one event.
    ///
    /// Fails fast on media extraction: a payload missing its primary media
    /// attachment is worse than no payload, so nothing partial is returned.
    pub async fn build(&self, event: &MessageEvent) -> Result<WebhookPayload> {
        let info = &event.info;
        let kind = classify(event);

        let mut message = MessageBody {
            id: info.id.clone(),
            ..Default::default()
        };
        if let Some(reply) = &info.reply {
            message.replied_id = reply.replied_id.clone();
            message.message_origin = reply.quoted_text.clone().unwrap_or_default();
        }

        // Link metadata is only surfaced when the body actually contains a
        // URL; the same regex drives classification, so Type and the text
        // fields cannot disagree.
        match &event.content {
            MessageContent::ExtendedText(ext) if LINK_RE.is_match(&ext.text) => {
                if let Some(title) = &ext.title {
                    if !title.is_empty() {
                        message.title_link = Some(title.clone());
                    }
                }
                if let Some(description) = &ext.description {
                    if !description.is_empty() {
                        message.link_description = Some(description.clone());
                    }
                }
                message.text_message = ext.text.clone();
            }
            MessageContent::PollUpdate(update) => {
                debug!(poll_id = %update.poll_id, "Poll update received");
                message.poll_update = Some(PollUpdateBody {
                    poll_id: update.poll_id.clone(),
                    selected_options: Vec::new(),
                });
            }
            _ => message.text_message = event.resolved_text().to_string(),
        }

        let is_group = info.chat.is_group();
        let group_name = if is_group {
            // Best effort; a failed lookup never fails the payload.
            match self.groups.group_name(&info.chat).await {
                Ok(name) => name.filter(|n| !n.is_empty()),
                Err(e) => {
                    error!(chat = %info.chat, error = %e, "Failed to get group name");
                    None
                }
            }
        } else {
            None
        };

        let my_number = self
            .own_jid
            .as_ref()
            .map(|own| own.phone() == info.sender.phone())
            .unwrap_or(false);

        let reaction = match &event.content {
            MessageContent::Reaction(r) if !r.text.is_empty() => Some(ReactionBody {
                message: r.text.clone(),
                target_id: r.target_id.clone(),
            }),
            _ => None,
        };

        let mut payload = WebhookPayload {
            sender_number: info.sender.to_string(),
            message,
            push_name: info.push_name.clone().filter(|n| !n.is_empty()),
            reaction,
            view_once: info.view_once.then_some(true),
            forwarded: event.is_forwarded().then_some(true),
            timestamp: info.timestamp.to_rfc3339(),
            is_group,
            group_name,
            my_number,
            kind,
            port: self.port,
            audio: None,
            document: None,
            image: None,
            sticker: None,
            video: None,
            list: None,
            live_location: None,
            location: None,
            order: None,
            contact: None,
        };

        match &event.content {
            MessageContent::Audio(audio) => {
                payload.audio = Some(self.extract(&audio.media).await?);
            }
            MessageContent::Document(doc) => {
                payload.document = Some(self.extract(&doc.media).await?);
            }
            MessageContent::Image(image) => {
                payload.image = Some(self.extract(&image.media).await?);
            }
            MessageContent::Sticker(sticker) => {
                payload.sticker = Some(self.extract(&sticker.media).await?);
            }
            MessageContent::Video(video) => {
                payload.video = Some(self.extract(&video.media).await?);
            }
            MessageContent::List(list) => payload.list = Some(list.clone()),
            MessageContent::LiveLocation(live) => payload.live_location = Some(live.clone()),
            MessageContent::Location(location) => payload.location = Some(location.clone()),
            MessageContent::Order(order) => payload.order = Some(order.clone()),
            MessageContent::Contact(card) => payload.contact = Some(vec![card.clone()]),
            MessageContent::ContactsArray(cards) => payload.contact = Some(cards.clone()),
            _ => {}
        }

        Ok(payload)
    }

    async fn extract(&self, media: &courier_core::event::MediaRef) -> Result<PathBuf> {
        self.media
            .extract(&self.media_dir, media)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to extract media");
                WebhookError::MediaExtraction(e.to_string())
            })
    }
}

/// How many of the mutually exclusive media keys a payload carries; used by
/// tests to pin the at-most-one invariant.
pub fn media_key_count(payload: &WebhookPayload) -> usize {
    [
        payload.audio.is_some(),
        payload.document.is_some(),
        payload.image.is_some(),
        payload.sticker.is_some(),
        payload.video.is_some(),
    ]
    .iter()
    .filter(|present| **present)
    .count()
}
