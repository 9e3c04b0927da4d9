//! HTTP access to the AniTinder backend.
//!
//! [`ApiClient`] is the only type; endpoint groups are split across the
//! submodules as inherent `impl` blocks.

pub mod api;
mod catalog;
mod chat;
mod library;
mod social;
mod users;

pub use api::{ApiClient, Interceptor};
