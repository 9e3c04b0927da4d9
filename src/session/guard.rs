//! Access gate for views that need a signed-in user.

use tracing::{debug, warn};

use crate::clients::ApiClient;
use crate::domain::ClientEvent;
use crate::error::{ClientError, Result};
use crate::models::CurrentUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardState {
    /// Not checked yet; render a loading affordance.
    #[default]
    Unknown,
    Authorized,
    /// Terminal: navigate to login.
    Unauthorized,
}

/// One guard per view instance. The first check decides the outcome and
/// later checks return it unchanged.
#[derive(Debug, Default)]
pub struct RouteGuard {
    state: GuardState,
    failure: Option<ClientError>,
}

impl RouteGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> GuardState {
        self.state
    }

    /// Confirms the stored token with a live `users/me/` round-trip.
    pub async fn check(&mut self, api: &ApiClient) -> GuardState {
        if self.state != GuardState::Unknown {
            return self.state;
        }

        let session = api.session();
        if session.token().is_none() {
            debug!("No stored token");
            session.emit(ClientEvent::LoginRequired {
                reason: "not logged in".to_string(),
            });
            self.state = GuardState::Unauthorized;
            self.failure = Some(ClientError::NotAuthenticated);
            return self.state;
        }

        self.state = match api.me().await {
            Ok(account) => match session.restore(CurrentUser::from(account)) {
                Ok(()) => GuardState::Authorized,
                Err(e) => {
                    warn!(error = %e, "Failed to cache confirmed identity");
                    session.invalidate("session storage unavailable");
                    self.failure = Some(e);
                    GuardState::Unauthorized
                }
            },
            // The HTTP client already wiped the session and signalled login.
            Err(ClientError::Unauthorized) => {
                self.failure = Some(ClientError::Unauthorized);
                GuardState::Unauthorized
            }
            Err(e) => {
                warn!(error = %e, "Authentication check failed");
                session.invalidate("authentication check failed");
                self.failure = Some(e);
                GuardState::Unauthorized
            }
        };
        self.state
    }

    /// Runs the check and hands back the confirmed identity.
    ///
    /// A rejection carries the error that decided it the first time it is
    /// reported, and [`ClientError::NotAuthenticated`] afterwards.
    pub async fn require(&mut self, api: &ApiClient) -> Result<CurrentUser> {
        match self.check(api).await {
            GuardState::Authorized => api
                .session()
                .current_user()
                .ok_or(ClientError::NotAuthenticated),
            GuardState::Unknown | GuardState::Unauthorized => Err(self
                .failure
                .take()
                .unwrap_or(ClientError::NotAuthenticated)),
        }
    }
}
