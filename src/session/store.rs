//! Login, registration, logout and startup hydration.

use reqwest::Method;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use super::SessionContext;
use crate::clients::ApiClient;
use crate::domain::ClientEvent;
use crate::error::{ClientError, Result};
use crate::models::user::{AccountInfo, LoginRequest, LoginResponse, RegisterRequest};
use crate::models::CurrentUser;

pub struct SessionStore {
    api: ApiClient,
    last_error: Mutex<Option<String>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            last_error: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn context(&self) -> &Arc<SessionContext> {
        self.api.session()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.context().current_user()
    }

    /// The message surfaced by the last failed login or registration.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hydrates the identity on startup.
    ///
    /// Cached user fields are trusted as-is; a bare token is checked against
    /// `users/me/` and any failure there logs the session out.
    pub async fn init(&self) -> Result<Option<CurrentUser>> {
        let stored = self.context().stored();
        if !stored.has_token() {
            return Ok(None);
        }

        if let (Some(username), Some(id)) = (stored.username, stored.user_id) {
            let user = CurrentUser { id, username };
            self.context().restore(user.clone())?;
            return Ok(Some(user));
        }

        match self.api.me().await {
            Ok(info) => {
                let user = CurrentUser::from(info);
                self.context().restore(user.clone())?;
                info!(user_id = %user.id, "Session restored from token");
                Ok(Some(user))
            }
            Err(e) => {
                warn!(error = %e, "Stored token rejected, logging out");
                self.logout().await;
                Ok(None)
            }
        }
    }

    /// On failure the previous session (if any) is left untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<CurrentUser> {
        self.set_error(None);

        let request = self
            .api
            .anonymous_request(Method::POST, "users/login/")?
            .json(&LoginRequest { username, password });

        let response = match self.api.send_unguarded(request).await {
            Ok(response) => response,
            Err(e) => {
                let err = credential_error(e, "Invalid credentials");
                self.set_error(Some(err.to_string()));
                return Err(err);
            }
        };

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        let user = CurrentUser {
            id: body.user_id,
            username: body.username.unwrap_or_else(|| username.to_string()),
        };
        self.context().establish(body.token, user.clone())?;
        Ok(user)
    }

    /// Creates an account. The caller still has to log in afterwards.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AccountInfo> {
        self.set_error(None);

        let request = self
            .api
            .anonymous_request(Method::POST, "users/register/")?
            .json(&RegisterRequest {
                username,
                email,
                password,
            });

        match self.api.send_unguarded(request).await {
            Ok(response) => {
                let account: AccountInfo = response
                    .json()
                    .await
                    .map_err(|e| ClientError::Decode(e.to_string()))?;
                info!(username = %account.username, "Account registered");
                Ok(account)
            }
            Err(e) => {
                let err = credential_error(e, "Failed to register. Please try again.");
                self.set_error(Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Tells the server (best effort) and always clears local credentials.
    pub async fn logout(&self) {
        if self.context().token().is_some() {
            let notify = async {
                let request = self.api.request(Method::POST, "users/logout/")?;
                self.api.send_unguarded(request).await.map(|_| ())
            };
            if let Err(e) = notify.await {
                warn!(error = %e, "Logout request failed");
            }
        }

        if let Err(e) = self.context().clear() {
            warn!(error = %e, "Failed to clear session storage");
        }
        info!("Logged out");
        self.context().emit(ClientEvent::LoggedOut);
    }

    fn set_error(&self, message: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }
}

/// Credential endpoints answer 400/401 with a `detail`; both are user errors.
fn credential_error(err: ClientError, fallback: &str) -> ClientError {
    match err {
        ClientError::Validation(msg) if msg.trim().is_empty() => {
            ClientError::Validation(fallback.to_string())
        }
        ClientError::Unauthorized => ClientError::Validation(fallback.to_string()),
        other => other,
    }
}
