//! Client-side notifications.
//!
//! Events are published on the session's broadcast channel. Front ends
//! subscribe to render toasts and to react to navigation signals such as
//! [`ClientEvent::LoginRequired`].

use serde::Serialize;

use crate::models::CurrentUser;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientEvent {
    /// Credentials were wiped; the front end should navigate to login.
    LoginRequired {
        reason: String,
    },

    LoggedIn {
        user: CurrentUser,
    },

    LoggedOut,

    Toast {
        level: ToastLevel,
        message: String,
    },
}

impl ClientEvent {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Toast {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}
