use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::account::Platform;
use crate::id::{AccountId, BrandId, ConversationId, MessageId};

/// What kind of inbound thread a conversation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    DirectMessage,
    Comment,
    Mention,
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationKind::DirectMessage => write!(f, "direct_message"),
            ConversationKind::Comment => write!(f, "comment"),
            ConversationKind::Mention => write!(f, "mention"),
        }
    }
}

impl FromStr for ConversationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct_message" | "dm" => Ok(ConversationKind::DirectMessage),
            "comment" => Ok(ConversationKind::Comment),
            "mention" => Ok(ConversationKind::Mention),
            other => Err(format!("invalid conversation kind: '{other}'")),
        }
    }
}

/// Triage state of a conversation.
///
/// - Open: needs a response
/// - Pending: we replied, waiting on the other party
/// - Resolved: done; a new inbound message reopens it
/// - Archived: hidden from default views; a new inbound message reopens it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Open,
    Pending,
    Resolved,
    Archived,
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationStatus::Open => write!(f, "open"),
            ConversationStatus::Pending => write!(f, "pending"),
            ConversationStatus::Resolved => write!(f, "resolved"),
            ConversationStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(ConversationStatus::Open),
            "pending" => Ok(ConversationStatus::Pending),
            "resolved" => Ok(ConversationStatus::Resolved),
            "archived" => Ok(ConversationStatus::Archived),
            other => Err(format!("invalid conversation status: '{other}'")),
        }
    }
}

/// An inbound message thread tied to a social account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub brand_id: BrandId,
    pub social_account_id: AccountId,
    pub kind: ConversationKind,
    /// Platform thread key: the DM sender id, the root comment id, or the
    /// mentioning media id.
    pub external_thread_id: String,
    pub participant_handle: Option<String>,
    pub participant_name: Option<String>,
    pub status: ConversationStatus,
    pub unread_count: i64,
    pub last_message_at: DateTime<Utc>,
    pub last_message_preview: Option<String>,
    /// For comments and mentions: the media the thread hangs off.
    pub media_external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageDirection::Inbound => write!(f, "inbound"),
            MessageDirection::Outbound => write!(f, "outbound"),
        }
    }
}

impl FromStr for MessageDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inbound" => Ok(MessageDirection::Inbound),
            "outbound" => Ok(MessageDirection::Outbound),
            other => Err(format!("invalid message direction: '{other}'")),
        }
    }
}

/// A single message within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub direction: MessageDirection,
    pub body: String,
    /// Platform message/comment id, used for de-duplication.
    pub external_id: Option<String>,
    pub sender_handle: Option<String>,
    pub sent_at: DateTime<Utc>,
}

/// Platform event normalized from a webhook delivery or a comment sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub platform: Platform,
    /// Receiving account's platform id (Instagram business user id, page id).
    pub account_external_id: String,
    pub kind: ConversationKind,
    pub thread_id: String,
    pub sender_id: Option<String>,
    pub sender_handle: Option<String>,
    pub text: String,
    pub external_message_id: Option<String>,
    pub media_external_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Maximum preview length stored on the conversation row.
pub const PREVIEW_CHARS: usize = 120;

/// Build a single-line preview of a message body.
pub fn preview(body: &str) -> String {
    let flat: String = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS - 1).collect();
        format!("{}…", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_aliases() {
        assert_eq!(
            "dm".parse::<ConversationKind>().unwrap(),
            ConversationKind::DirectMessage
        );
        assert_eq!(ConversationKind::DirectMessage.to_string(), "direct_message");
    }

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("hi\n\n  there"), "hi there");
        let long = "a ".repeat(200);
        let p = preview(&long);
        assert!(p.chars().count() <= PREVIEW_CHARS);
        assert!(p.ends_with('…'));
    }
}
