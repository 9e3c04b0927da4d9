use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;
use crate::models::UserId;

/// Identity of the one-to-one chat room between two users: both ids in
/// ascending numeric order joined with `_`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId {
    low: UserId,
    high: UserId,
}

impl RoomId {
    #[must_use]
    pub fn between(a: UserId, b: UserId) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    #[must_use]
    pub const fn participants(&self) -> (UserId, UserId) {
        (self.low, self.high)
    }

    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.low == user || self.high == user
    }

    /// The other participant as seen from `me`.
    ///
    /// A room with the same id on both sides is a chat with oneself and
    /// yields `me` back.
    pub fn counterpart(&self, me: UserId) -> Result<UserId, ClientError> {
        if self.low == me {
            Ok(self.high)
        } else if self.high == me {
            Ok(self.low)
        } else {
            Err(ClientError::InvalidRoom(format!(
                "{self} does not include user {me}"
            )))
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.low, self.high)
    }
}

impl FromStr for RoomId {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClientError::InvalidRoom(s.to_string());
        let (a, b) = s.trim().split_once('_').ok_or_else(invalid)?;
        let a: UserId = a.parse().map_err(|_| invalid())?;
        let b: UserId = b.parse().map_err(|_| invalid())?;
        Ok(Self::between(a, b))
    }
}

impl TryFrom<String> for RoomId {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoomId> for String {
    fn from(room: RoomId) -> Self {
        room.to_string()
    }
}
