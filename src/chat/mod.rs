//! One-to-one chat: room identity, the realtime channel and message rendering.

pub mod channel;
pub mod render;
pub mod room;
mod session;

pub use channel::ChatChannel;
pub use room::RoomId;
pub use session::{ChatSession, room_url};
