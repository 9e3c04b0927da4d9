mod account;
mod catalog;
mod chat;
mod feed;
mod list;
mod social;

pub use account::{cmd_init, cmd_login, cmd_logout, cmd_register, cmd_whoami};
pub use catalog::{cmd_genres, cmd_quotes, cmd_search};
pub use chat::{cmd_chat, cmd_chats};
pub use feed::cmd_feed;
pub use list::{
    cmd_list_add, cmd_list_remove, cmd_list_show, cmd_list_status, cmd_skipped_clear,
    cmd_skipped_list, cmd_skipped_restore,
};
pub use social::{
    cmd_follow, cmd_followers, cmd_following, cmd_friend_accept, cmd_friend_add,
    cmd_friend_cancel, cmd_friend_decline, cmd_friend_remove, cmd_friend_requests,
    cmd_friends_list, cmd_friends_sent, cmd_profile_edit, cmd_profile_show, cmd_unfollow,
    cmd_users,
};

use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;
use tracing::warn;

use crate::clients::ApiClient;
use crate::config::Config;
use crate::domain::{ClientEvent, ToastLevel};
use crate::error::ClientError;
use crate::models::CurrentUser;
use crate::session::{FileStorage, RouteGuard, SessionContext, SessionStore};

/// Everything a command handler needs: config, the API client and the session.
pub struct App {
    pub config: Config,
    pub store: SessionStore,
    events: Mutex<broadcast::Receiver<ClientEvent>>,
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let storage = Arc::new(FileStorage::new(config.session.storage_path()));
        let context = SessionContext::new(storage);
        let events = Mutex::new(context.subscribe());
        let api = ApiClient::new(&config.api, context)?;

        Ok(Self {
            config,
            store: SessionStore::new(api),
            events,
        })
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        self.store.api()
    }

    /// Hydrates the stored session once per process. A bare token is checked
    /// against the server and dropped when it fails.
    pub async fn restore_session(&self) -> Option<CurrentUser> {
        match self.store.init().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Failed to restore session");
                None
            }
        }
    }

    /// Confirms the stored session with the server before a protected command.
    pub async fn require_login(&self) -> anyhow::Result<CurrentUser> {
        let mut guard = RouteGuard::new();
        match guard.require(self.api()).await {
            Ok(user) => Ok(user),
            Err(e) => {
                self.flush_events();
                Err(login_error(e))
            }
        }
    }

    /// Prints toasts and navigation signals published since the last call.
    pub fn flush_events(&self) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match events.try_recv() {
                Ok(event) => print_event(&event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => break,
            }
        }
    }
}

fn login_error(err: ClientError) -> anyhow::Error {
    if err.is_unauthorized() {
        anyhow::anyhow!("Not logged in. Run `anitinder login <username>` first.")
    } else {
        anyhow::Error::new(err)
            .context("Could not confirm the session. Run `anitinder login <username>` once the server is reachable.")
    }
}

fn print_event(event: &ClientEvent) {
    match event {
        ClientEvent::Toast { level, message } => {
            let marker = match level {
                ToastLevel::Success => "✓",
                ToastLevel::Info => "•",
                ToastLevel::Error => "✗",
            };
            println!("{marker} {message}");
        }
        ClientEvent::LoginRequired { reason } => {
            eprintln!("⚠ Session ended ({reason}). Log in again with `anitinder login`.");
        }
        ClientEvent::LoggedIn { user } => println!("✓ Logged in as {} (id {})", user.username, user.id),
        ClientEvent::LoggedOut => println!("✓ Logged out"),
    }
}

pub(crate) fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

pub(crate) async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> anyhow::Result<Option<String>> {
    use std::io::Write;
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}
