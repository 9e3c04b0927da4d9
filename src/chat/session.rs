use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;

use super::channel::ChatChannel;
use super::room::RoomId;
use crate::clients::ApiClient;
use crate::domain::ClientEvent;
use crate::error::{ClientError, Result};
use crate::models::{ChatMessage, CurrentUser, OutboundEnvelope, Profile, UserId};

/// An entered chat room: history, participant profiles and the live channel.
///
/// Dropping the session tears the channel down.
#[derive(Debug)]
pub struct ChatSession {
    api: ApiClient,
    room: RoomId,
    me: CurrentUser,
    counterpart: UserId,
    messages: Vec<ChatMessage>,
    profiles: HashMap<UserId, Profile>,
    channel: ChatChannel,
}

/// `{ws_base}chat/{room}/`.
pub fn room_url(ws_base: &str, room: &RoomId) -> Result<Url> {
    let mut base = Url::parse(ws_base)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(&format!("chat/{room}/"))?)
}

impl ChatSession {
    pub async fn enter(api: &ApiClient, ws_base: &str, room: RoomId) -> Result<Self> {
        let me = api
            .session()
            .current_user()
            .ok_or(ClientError::NotAuthenticated)?;
        let counterpart = room.counterpart(me.id)?;
        let url = room_url(ws_base, &room)?;

        let (history, my_profile, their_profile) = tokio::join!(
            api.chat_history(&room),
            api.profile(me.id),
            api.profile(counterpart),
        );
        let messages = history.map_err(|e| ClientError::load("chat history", e))?;

        let mut profiles = HashMap::new();
        for (id, result) in [(me.id, my_profile), (counterpart, their_profile)] {
            match result {
                Ok(profile) => {
                    profiles.insert(id, profile);
                }
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => warn!(user_id = %id, error = %e, "Profile unavailable for chat"),
            }
        }

        let channel = ChatChannel::connect(&url).await?;
        info!(%room, history = messages.len(), "Entered chat room");

        Ok(Self::from_parts(api.clone(), room, me, counterpart, messages, profiles, channel))
    }

    pub(crate) fn from_parts(
        api: ApiClient,
        room: RoomId,
        me: CurrentUser,
        counterpart: UserId,
        messages: Vec<ChatMessage>,
        profiles: HashMap<UserId, Profile>,
        channel: ChatChannel,
    ) -> Self {
        Self {
            api,
            room,
            me,
            counterpart,
            messages,
            profiles,
            channel,
        }
    }

    #[must_use]
    pub const fn room(&self) -> &RoomId {
        &self.room
    }

    #[must_use]
    pub const fn me(&self) -> &CurrentUser {
        &self.me
    }

    #[must_use]
    pub const fn counterpart(&self) -> UserId {
        self.counterpart
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn profile(&self, user: UserId) -> Option<&Profile> {
        self.profiles.get(&user)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Name shown next to a message.
    #[must_use]
    pub fn sender_name(&self, message: &ChatMessage) -> String {
        if let Some(profile) = self.profile(message.sender) {
            return profile.username.clone();
        }
        if let Some(name) = &message.sender_username {
            return name.clone();
        }
        if message.sender == self.me.id {
            return self.me.username.clone();
        }
        format!("User {}", message.sender)
    }

    /// Waits for the next inbound message and appends it.
    pub async fn next_message(&mut self) -> Option<&ChatMessage> {
        let message = self.channel.recv().await?;
        self.messages.push(message);
        self.messages.last()
    }

    /// Appends whatever already arrived without waiting. Returns how many.
    pub fn drain_pending(&mut self) -> usize {
        let mut count = 0;
        while let Some(message) = self.channel.try_recv() {
            self.messages.push(message);
            count += 1;
        }
        count
    }

    /// Returns `Ok(false)` for blank input, which is not sent.
    ///
    /// The message is not appended locally; it shows up when the server
    /// echoes it back to the room.
    pub async fn send(&self, content: &str) -> Result<bool> {
        if content.trim().is_empty() {
            return Ok(false);
        }

        let envelope = OutboundEnvelope {
            content: content.to_string(),
            sender: self.me.id,
            receiver: self.counterpart,
        };
        match self.channel.send(&envelope).await {
            Ok(()) => {
                debug!(room = %self.room, "Chat message sent");
                Ok(true)
            }
            Err(e) => {
                self.api.session().emit(ClientEvent::error(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn close(self) {
        self.channel.close().await;
        info!(room = %self.room, "Left chat room");
    }
}
