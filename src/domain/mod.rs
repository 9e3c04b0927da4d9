//! Cross-cutting domain types shared by the session, views and CLI.

pub mod events;

pub use events::{ClientEvent, ToastLevel};
