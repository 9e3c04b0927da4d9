//! Chat history endpoints. The realtime side lives in [`crate::chat`].

use super::api::ApiClient;
use crate::chat::RoomId;
use crate::error::Result;
use crate::models::chat::NewConversation;
use crate::models::{ChatMessage, Conversation, UserId};

impl ApiClient {
    pub async fn chat_history(&self, room: &RoomId) -> Result<Vec<ChatMessage>> {
        self.get(&format!("chat/messages/{room}/")).await
    }

    pub async fn conversations(&self) -> Result<Vec<Conversation>> {
        self.get("chat/").await
    }

    /// Returns the existing conversation with `participant` or creates one.
    pub async fn open_conversation(&self, participant: UserId) -> Result<Conversation> {
        self.post(
            "chat/create/",
            &NewConversation {
                participant_id: participant,
            },
        )
        .await
    }
}
