//! The explicit session context passed to every component.
//!
//! Lifecycle: hydrated from storage (or the server) by
//! [`SessionStore::init`](super::SessionStore::init), torn down by logout or by
//! the first unauthorized response observed by the HTTP client.

use reqwest::{RequestBuilder, StatusCode};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::storage::{MemoryStorage, SessionStorage, StoredSession};
use crate::clients::api::Interceptor;
use crate::domain::ClientEvent;
use crate::error::Result;
use crate::models::CurrentUser;

const EVENT_BUFFER: usize = 64;

pub struct SessionContext {
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<CurrentUser>>,
    events: broadcast::Sender<ClientEvent>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("current", &self.current_user())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Arc::new(Self {
            storage,
            current: RwLock::new(None),
            events,
        })
    }

    #[must_use]
    pub fn in_memory() -> Arc<Self> {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: ClientEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Snapshot of persisted state. Unreadable storage counts as empty.
    #[must_use]
    pub fn stored(&self) -> StoredSession {
        self.storage.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read session storage");
            StoredSession::default()
        })
    }

    /// The persisted token, read fresh on every call.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.stored().token.filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some() && self.token().is_some()
    }

    /// Persists a fresh login and exposes the identity.
    pub fn establish(&self, token: String, user: CurrentUser) -> Result<()> {
        self.storage.save(&StoredSession {
            token: Some(token),
            username: Some(user.username.clone()),
            user_id: Some(user.id),
        })?;
        self.set_current(Some(user.clone()));
        info!(user_id = %user.id, username = %user.username, "Session established");
        self.emit(ClientEvent::LoggedIn { user });
        Ok(())
    }

    /// Adopts an identity confirmed by the server, caching its fields next to
    /// the existing token.
    pub fn restore(&self, user: CurrentUser) -> Result<()> {
        let mut stored = self.stored();
        if stored.username.as_deref() != Some(user.username.as_str())
            || stored.user_id != Some(user.id)
        {
            stored.username = Some(user.username.clone());
            stored.user_id = Some(user.id);
            self.storage.save(&stored)?;
        }
        self.set_current(Some(user));
        Ok(())
    }

    /// Wipes persisted credentials and the in-memory identity.
    pub fn clear(&self) -> Result<()> {
        self.set_current(None);
        self.storage.clear()?;
        Ok(())
    }

    /// Clears the session and signals navigation to login.
    pub fn invalidate(&self, reason: &str) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "Failed to clear session storage");
        }
        info!(reason, "Session invalidated");
        self.emit(ClientEvent::LoginRequired {
            reason: reason.to_string(),
        });
    }

    fn set_current(&self, user: Option<CurrentUser>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = user;
    }
}

impl Interceptor for SessionContext {
    fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("Token {token}")),
            None => request,
        }
    }

    fn on_response(&self, status: StatusCode) {
        if status == StatusCode::UNAUTHORIZED {
            self.invalidate("server rejected credentials");
        }
    }
}
