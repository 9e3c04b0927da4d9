//! CLI module - Command-line interface for AniTinder
//!
//! This module provides a structured CLI using clap for argument parsing.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{ListStatus, MalId, SearchSort, UserId};

/// AniTinder - swipe through anime, keep a list, chat with friends
#[derive(Parser, Debug)]
#[command(name = "anitinder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and remember the session
    Login {
        username: String,
        /// Prompted for when omitted
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    #[command(alias = "me")]
    Whoami,

    /// Swipe through random recommendations
    #[command(alias = "find")]
    Feed {
        /// Minimum score (inclusive)
        #[arg(long)]
        min_score: Option<f32>,
        /// Only offer these genres (repeatable)
        #[arg(long = "genre")]
        genres: Vec<String>,
    },

    /// Manage your anime list
    #[command(alias = "ls")]
    List {
        #[command(subcommand)]
        command: Option<ListCommands>,
    },

    /// Manage skipped anime
    Skipped {
        #[command(subcommand)]
        command: Option<SkippedCommands>,
    },

    /// Search the catalog
    #[command(alias = "s")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        #[arg(long, default_value = "popularity", value_parser = parse_sort)]
        sort: SearchSort,
        #[arg(long)]
        genre: Option<String>,
    },

    /// List catalog genres
    Genres,

    /// Show a few random quotes
    Quotes,

    /// List registered users
    Users {
        /// Filter by name
        filter: Option<String>,
    },

    /// Show or edit profiles
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },

    /// Manage friends and friend requests
    Friends {
        #[command(subcommand)]
        command: Option<FriendsCommands>,
    },

    /// Follow a user
    Follow { user: UserId },

    /// Stop following a user
    Unfollow { user: UserId },

    /// Users following someone (default: you)
    Followers { user: Option<UserId> },

    /// Users someone follows (default: you)
    Following { user: Option<UserId> },

    /// Open a live chat with a user
    Chat { user: UserId },

    /// List your conversations
    Chats,

    /// Create default config file
    Init,
}

#[derive(Subcommand, Debug)]
pub enum ListCommands {
    /// Show the list, optionally one status only
    Show {
        #[arg(value_parser = parse_status)]
        status: Option<ListStatus>,
        /// Show another user's public list
        #[arg(long)]
        user: Option<UserId>,
    },
    /// Set (or toggle) the status of an entry
    Status {
        mal_id: MalId,
        /// Omit to toggle between watched and plan to watch
        #[arg(value_parser = parse_status)]
        status: Option<ListStatus>,
    },
    /// Remove an entry by its list id
    #[command(alias = "rm")]
    Remove { id: u64 },
    /// Add a catalog title by MAL id
    Add {
        mal_id: MalId,
        #[arg(value_parser = parse_status, default_value = "plan")]
        status: ListStatus,
    },
}

#[derive(Subcommand, Debug)]
pub enum SkippedCommands {
    #[command(alias = "ls")]
    List,
    /// Make one skipped title recommendable again
    Restore { id: u64 },
    /// Forget every skip
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show a profile (default: yours)
    Show { user: Option<UserId> },
    /// Update your username, bio or picture
    Edit {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Path to an image file
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FriendsCommands {
    /// Your friends (or another user's)
    #[command(alias = "ls")]
    List { user: Option<UserId> },
    /// Incoming requests
    Requests,
    /// Requests you sent
    Sent,
    /// Send a friend request
    Add { user: UserId },
    Accept { request_id: u64 },
    Decline { request_id: u64 },
    /// Withdraw a request you sent
    Cancel { request_id: u64 },
    /// Remove a friend
    #[command(alias = "rm")]
    Remove { user: UserId },
}

fn parse_status(s: &str) -> Result<ListStatus, String> {
    s.parse()
}

fn parse_sort(s: &str) -> Result<SearchSort, String> {
    s.parse()
}
