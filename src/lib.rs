pub mod chat;
pub mod cli;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod models;
pub mod session;
pub mod views;

use anyhow::Context;
use cli::commands::{self, App};
use cli::{Cli, Commands, FriendsCommands, ListCommands, ProfileCommands, SkippedCommands};
pub use config::Config;
pub use error::{ClientError, Result};
use tracing_subscriber::EnvFilter;

/// Reads the config named on the command line, or the first one found on the
/// default search path.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        // `init` is what creates the file.
        Some(path) if !path.exists() && matches!(cli.command, Some(Commands::Init)) => {
            Ok(Config::default())
        }
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let Some(command) = cli.command else {
        print_help();
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        return commands::cmd_init(cli.config.as_deref());
    }

    config.validate().context("Invalid configuration")?;
    let app = App::new(config)?;
    app.restore_session().await;

    let result = dispatch(&app, command).await;
    app.flush_events();
    result
}

async fn dispatch(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            commands::cmd_login(app, &username, password).await
        }
        Commands::Register {
            username,
            email,
            password,
        } => commands::cmd_register(app, &username, &email, password).await,
        Commands::Logout => commands::cmd_logout(app).await,
        Commands::Whoami => commands::cmd_whoami(app).await,

        Commands::Feed { min_score, genres } => commands::cmd_feed(app, min_score, genres).await,

        Commands::List { command } => match command {
            None => commands::cmd_list_show(app, None, None).await,
            Some(ListCommands::Show { status, user }) => {
                commands::cmd_list_show(app, status, user).await
            }
            Some(ListCommands::Status { mal_id, status }) => {
                commands::cmd_list_status(app, mal_id, status).await
            }
            Some(ListCommands::Remove { id }) => commands::cmd_list_remove(app, id).await,
            Some(ListCommands::Add { mal_id, status }) => {
                commands::cmd_list_add(app, mal_id, status).await
            }
        },

        Commands::Skipped { command } => match command {
            None | Some(SkippedCommands::List) => commands::cmd_skipped_list(app).await,
            Some(SkippedCommands::Restore { id }) => commands::cmd_skipped_restore(app, id).await,
            Some(SkippedCommands::Clear) => commands::cmd_skipped_clear(app).await,
        },

        Commands::Search { query, sort, genre } => {
            commands::cmd_search(app, &query.join(" "), sort, genre).await
        }
        Commands::Genres => commands::cmd_genres(app).await,
        Commands::Quotes => commands::cmd_quotes(app).await,
        Commands::Users { filter } => commands::cmd_users(app, filter).await,

        Commands::Profile { command } => match command {
            None => commands::cmd_profile_show(app, None).await,
            Some(ProfileCommands::Show { user }) => commands::cmd_profile_show(app, user).await,
            Some(ProfileCommands::Edit {
                username,
                bio,
                image,
            }) => commands::cmd_profile_edit(app, username, bio, image).await,
        },

        Commands::Friends { command } => match command {
            None => commands::cmd_friends_list(app, None).await,
            Some(FriendsCommands::List { user }) => commands::cmd_friends_list(app, user).await,
            Some(FriendsCommands::Requests) => commands::cmd_friend_requests(app).await,
            Some(FriendsCommands::Sent) => commands::cmd_friends_sent(app).await,
            Some(FriendsCommands::Add { user }) => commands::cmd_friend_add(app, user).await,
            Some(FriendsCommands::Accept { request_id }) => {
                commands::cmd_friend_accept(app, request_id).await
            }
            Some(FriendsCommands::Decline { request_id }) => {
                commands::cmd_friend_decline(app, request_id).await
            }
            Some(FriendsCommands::Cancel { request_id }) => {
                commands::cmd_friend_cancel(app, request_id).await
            }
            Some(FriendsCommands::Remove { user }) => commands::cmd_friend_remove(app, user).await,
        },

        Commands::Follow { user } => commands::cmd_follow(app, user).await,
        Commands::Unfollow { user } => commands::cmd_unfollow(app, user).await,
        Commands::Followers { user } => commands::cmd_followers(app, user).await,
        Commands::Following { user } => commands::cmd_following(app, user).await,

        Commands::Chat { user } => commands::cmd_chat(app, user).await,
        Commands::Chats => commands::cmd_chats(app).await,

        Commands::Init => commands::cmd_init(None),
    }
}

fn print_help() {
    println!("AniTinder - swipe through anime, keep a list, chat with friends");
    println!();
    println!("Usage: anitinder <command> [args]");
    println!();
    println!("Getting started:");
    println!("  init                     Create a default config file");
    println!("  register <user> <email>  Create an account");
    println!("  login <user>             Log in");
    println!();
    println!("Discover:");
    println!("  feed                     Swipe through recommendations");
    println!("  search <query>           Search the catalog");
    println!("  list                     Show your anime list");
    println!("  skipped                  Show skipped anime");
    println!();
    println!("Social:");
    println!("  users | profile | friends | follow | chat <user_id>");
    println!();
    println!("Run 'anitinder help <command>' for details.");
}
