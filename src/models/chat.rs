use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

/// A message as kept in a conversation's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<u64>,
    pub sender: UserId,
    #[serde(default)]
    pub sender_username: Option<String>,
    #[serde(default)]
    pub receiver: Option<UserId>,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Frame pushed by the server over the realtime channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEnvelope {
    pub sender: UserId,
    pub receiver: UserId,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<InboundEnvelope> for ChatMessage {
    fn from(env: InboundEnvelope) -> Self {
        Self {
            id: None,
            sender: env.sender,
            sender_username: None,
            receiver: Some(env.receiver),
            content: env.message,
            timestamp: env.timestamp,
        }
    }
}

/// Frame sent by the client over the realtime channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    pub content: String,
    pub sender: UserId,
    pub receiver: UserId,
}

/// Conversation summary returned by `chat/` and `chat/create/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: u64,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub room_name_1: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NewConversation {
    pub participant_id: UserId,
}
