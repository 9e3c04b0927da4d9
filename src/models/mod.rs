pub mod anime;
pub mod chat;
pub mod social;
pub mod user;

pub use anime::{
    Anime, AnimeGenre, Genre, ListStatus, MalId, NewTempDeleted, NewUserAnime, Quote, SearchSort,
    StatusUpdate, TempDeletedAnime, UserAnime,
};
pub use chat::{ChatMessage, Conversation, InboundEnvelope, OutboundEnvelope};
pub use social::{FollowersList, FollowingList, FriendList, FriendRequest, UserRef};
pub use user::{CurrentUser, Profile, ProfileUpdate, UserId, UserSummary};
