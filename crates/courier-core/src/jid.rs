//! Chat identity handling
//!
//! A chat identity (JID) addresses either an individual contact or a group,
//! distinguished by the server suffix.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Server suffix for individual contacts
pub const USER_SERVER: &str = "s.whatsapp.net";
/// Server suffix for group chats
pub const GROUP_SERVER: &str = "g.us";

/// A parsed chat identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Jid {
    pub user: String,
    pub server: String,
}

impl Jid {
    /// Parse a raw identity string.
    ///
    /// Accepts either the full `user@server` form or a bare phone number,
    /// which is taken to address an individual contact.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CoreError::InvalidJid("empty identity".to_string()));
        }

        match raw.split_once('@') {
            Some((user, server)) => {
                if user.is_empty() || server.is_empty() {
                    return Err(CoreError::InvalidJid(raw.to_string()));
                }
                Ok(Self {
                    user: user.to_string(),
                    server: server.to_string(),
                })
            }
            None => {
                let digits = normalize_phone(raw);
                if digits.is_empty() {
                    return Err(CoreError::InvalidJid(raw.to_string()));
                }
                Ok(Self {
                    user: digits,
                    server: USER_SERVER.to_string(),
                })
            }
        }
    }

    pub fn user(user: &str) -> Self {
        Self {
            user: user.to_string(),
            server: USER_SERVER.to_string(),
        }
    }

    pub fn group(id: &str) -> Self {
        Self {
            user: id.to_string(),
            server: GROUP_SERVER.to_string(),
        }
    }

    /// Whether this identity addresses a group chat
    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }

    /// Phone number portion, normalized to dialable digits
    pub fn phone(&self) -> String {
        normalize_phone(&self.user)
    }
}

impl std::fmt::Display for Jid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}

/// Strip everything but dialable digits so region-formatted and canonical
/// forms of the same number compare equal.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
