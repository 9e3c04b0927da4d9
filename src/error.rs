//! Error type shared by the HTTP client, session, chat and views.

use reqwest::StatusCode;
use thiserror::Error;

/// How an error is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Expired or missing credentials: wipe the session and go to login.
    Auth,
    /// Failed read: show a message, keep whatever data is already loaded.
    Read,
    /// Rejected write: show a toast, do not mutate local state.
    Write,
    /// Realtime channel failure: show a toast, no automatic recovery.
    Channel,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Failed to load {what}: {source}")]
    Load {
        what: &'static str,
        #[source]
        source: Box<ClientError>,
    },

    #[error("Invalid chat room: {0}")]
    InvalidRoom(String),

    #[error("Connection lost. Please reopen the chat.")]
    ChannelNotOpen,

    #[error("Chat connection error: {0}")]
    Channel(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Maps a non-success HTTP status and the server's message onto a variant.
    #[must_use]
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::Validation(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Server { status, message },
        }
    }

    /// Wraps a failed batch member into a single load error.
    ///
    /// Authentication failures pass through untouched so callers can still
    /// route them to login.
    #[must_use]
    pub fn load(what: &'static str, err: Self) -> Self {
        match err {
            Self::Unauthorized | Self::NotAuthenticated => err,
            other => Self::Load {
                what,
                source: Box::new(other),
            },
        }
    }

    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized | Self::NotAuthenticated => ErrorCategory::Auth,
            Self::Validation(_) | Self::Conflict(_) => ErrorCategory::Write,
            Self::ChannelNotOpen | Self::Channel(_) | Self::InvalidRoom(_) => ErrorCategory::Channel,
            Self::NotFound(_)
            | Self::Server { .. }
            | Self::Network(_)
            | Self::Decode(_)
            | Self::Load { .. }
            | Self::Storage(_)
            | Self::Url(_) => ErrorCategory::Read,
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::NotAuthenticated)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Channel(err.to_string())
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Pulls a human-readable message out of an error body.
///
/// Accepts `{"detail": ..}`, `{"error": ..}`, `{"message": ..}`, a bare
/// string or a field map such as `{"username": ["already taken"]}`.
#[must_use]
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    message_from_value(&value)
}

fn message_from_value(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(message_from_value),
        Value::Object(map) => {
            for key in ["detail", "error", "message", "non_field_errors"] {
                if let Some(msg) = map.get(key).and_then(message_from_value) {
                    return Some(msg);
                }
            }
            map.iter().find_map(|(field, v)| {
                message_from_value(v).map(|msg| format!("{field}: {msg}"))
            })
        }
        _ => None,
    }
}
