//! Core types, traits, and configuration for chat-courier
//!
//! This crate holds everything the notification pipeline and the channel
//! services share:
//! - the inbound chat event model (a closed sum type over content variants)
//! - the message-kind taxonomy and its total classifier
//! - chat identity (JID) parsing and phone normalization
//! - MIME resolution for stored media files
//! - collaborator traits for media extraction, group lookup, and the
//!   protocol transport

pub mod config;
pub mod error;
pub mod event;
pub mod jid;
pub mod kind;
pub mod mime;
pub mod traits;

pub use self::config::*;
pub use error::*;
pub use event::*;
pub use jid::{normalize_phone, Jid, GROUP_SERVER, USER_SERVER};
pub use kind::{classify, MessageKind, LINK_RE};
pub use traits::*;
