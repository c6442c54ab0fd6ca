use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A notification transport the dispatch layer can deliver over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Telegram,
    Email,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Telegram => "telegram",
            Channel::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub telegram_chat_id: Option<String>,
    pub email: Option<String>,
    pub preferred_channel: Option<Channel>,
    pub fallback_enabled: bool,
}

impl Driver {
    /// A channel is available iff its contact field is non-empty after
    /// trimming whitespace.
    pub fn has_channel_config(&self, channel: Channel) -> bool {
        let contact = match channel {
            Channel::Telegram => self.telegram_chat_id.as_deref(),
            Channel::Email => self.email.as_deref(),
        };
        contact.is_some_and(|value| !value.trim().is_empty())
    }
}
