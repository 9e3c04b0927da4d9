//! Page-level state for each screen of the client.
//!
//! A view loads everything it renders in one parallel batch. Any failed
//! member aborts the batch and surfaces as a single load error; an expired
//! session stays [`ClientError::Unauthorized`] so callers can route to login.

pub mod discovery;
pub mod list;
pub mod profile;
pub mod search;
pub mod users;

use std::future::Future;

pub use discovery::DiscoveryView;
pub use list::{ListView, PublicListView};
pub use profile::{OwnProfileView, PublicProfileView, edit_profile};
pub use search::SearchView;
pub use users::UsersView;

use crate::clients::ApiClient;
use crate::domain::ClientEvent;
use crate::error::{ClientError, Result};
use crate::models::CurrentUser;

/// One member of a load batch.
pub(crate) async fn fetch<T>(what: &'static str, request: impl Future<Output = Result<T>>) -> Result<T> {
    request.await.map_err(|e| ClientError::load(what, e))
}

pub(crate) fn signed_in(api: &ApiClient) -> Result<CurrentUser> {
    api.session()
        .current_user()
        .ok_or(ClientError::NotAuthenticated)
}

/// Toasts the outcome of a write. Auth failures are left to the session,
/// which has already signalled login.
pub(crate) fn report<T>(api: &ApiClient, result: Result<T>, success: impl FnOnce(&T) -> String) -> Result<T> {
    match &result {
        Ok(value) => api.session().emit(ClientEvent::success(success(value))),
        Err(e) if e.is_unauthorized() => {}
        Err(e) => api.session().emit(ClientEvent::error(e.to_string())),
    }
    result
}
