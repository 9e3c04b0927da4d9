//! Profiles, friends and follows

use std::path::PathBuf;

use super::App;
use crate::models::{FriendRequest, ProfileUpdate, UserAnime, UserId, UserRef};
use crate::views::{OwnProfileView, PublicProfileView, UsersView, edit_profile};

fn print_people(title: &str, people: &[UserRef]) {
    println!("{title} ({})", people.len());
    for person in people {
        println!("  {} (id {})", person.username, person.id);
    }
}

fn print_recent(recent: &[UserAnime]) {
    println!("Recently added:");
    if recent.is_empty() {
        println!("  (nothing yet)");
    }
    for entry in recent {
        println!("  {} [{}]", entry.display_title(), entry.status());
    }
}

fn print_requests(title: &str, requests: &[FriendRequest], incoming: bool) {
    println!("{title} ({})", requests.len());
    println!("{:-<60}", "");
    for request in requests {
        let (id, name) = if incoming {
            (request.sender, request.sender_username.as_deref())
        } else {
            (request.receiver, request.receiver_username.as_deref())
        };
        let sent = request
            .created_at
            .map_or_else(String::new, |t| format!(" | {}", t.format("%Y-%m-%d %H:%M")));
        println!(
            "  #{}: {} (id {id}){sent}",
            request.id,
            name.unwrap_or("unknown")
        );
    }
}

pub async fn cmd_users(app: &App, filter: Option<String>) -> anyhow::Result<()> {
    let me = app.require_login().await?;
    let view = UsersView::load(app.api()).await?;
    let users = view.matching(Some(me.id), filter.as_deref().unwrap_or_default());

    println!("Users ({} total)", users.len());
    println!("{:-<60}", "");
    for user in users {
        println!("  {} (id {})", user.username, user.user_id);
    }
    Ok(())
}

pub async fn cmd_profile_show(app: &App, user: Option<UserId>) -> anyhow::Result<()> {
    let me = app.require_login().await?;

    match user.filter(|id| *id != me.id) {
        None => {
            let view = OwnProfileView::load(app.api()).await?;
            println!("{} (id {})", view.profile.username, view.profile.user_id);
            println!("{:-<60}", "");
            if !view.profile.bio.is_empty() {
                println!("{}", view.profile.bio);
                println!();
            }
            print_recent(&view.recent);
            print_people("Friends", &view.friends.friends);
            print_people("Following", &view.following.following);
            if !view.requests.is_empty() {
                println!();
                print_requests("Pending friend requests", &view.requests, true);
            }
        }
        Some(user) => {
            let view = PublicProfileView::load(app.api(), user).await?;
            println!("{} (id {})", view.profile.username, view.profile.user_id);
            println!("{:-<60}", "");
            if !view.profile.bio.is_empty() {
                println!("{}", view.profile.bio);
                println!();
            }
            print_recent(&view.recent);
            print_people("Friends", &view.friends.friends);
            print_people("Following", &view.following.following);
            print_people("Followers", &view.followers.followers);
            println!();
            println!(
                "Friend: {} | Following: {} | Chat room: {}",
                if view.is_friend() { "yes" } else { "no" },
                if view.is_followed_by_viewer() { "yes" } else { "no" },
                view.chat_room()
            );
        }
    }
    Ok(())
}

pub async fn cmd_profile_edit(
    app: &App,
    username: Option<String>,
    bio: Option<String>,
    image: Option<PathBuf>,
) -> anyhow::Result<()> {
    app.require_login().await?;
    let update = ProfileUpdate {
        username,
        bio,
        profile_image: image,
    };
    if update.is_empty() {
        println!("Nothing to update. Pass --username, --bio or --image.");
        return Ok(());
    }

    let result = edit_profile(app.api(), &update).await;
    app.flush_events();
    let profile = result?;
    println!("{} (id {})", profile.username, profile.user_id);
    Ok(())
}

pub async fn cmd_friends_list(app: &App, user: Option<UserId>) -> anyhow::Result<()> {
    let me = app.require_login().await?;
    let list = match user.filter(|id| *id != me.id) {
        Some(user) => app.api().friends_of(user).await?,
        None => app.api().my_friends().await?,
    };
    print_people(&format!("{}'s friends", list.user), &list.friends);
    Ok(())
}

pub async fn cmd_friend_requests(app: &App) -> anyhow::Result<()> {
    app.require_login().await?;
    let requests: Vec<_> = app
        .api()
        .friend_requests()
        .await?
        .into_iter()
        .filter(|r| r.is_active)
        .collect();
    print_requests("Incoming friend requests", &requests, true);
    Ok(())
}

pub async fn cmd_friends_sent(app: &App) -> anyhow::Result<()> {
    app.require_login().await?;
    let requests: Vec<_> = app
        .api()
        .sent_friend_requests()
        .await?
        .into_iter()
        .filter(|r| r.is_active)
        .collect();
    print_requests("Sent friend requests", &requests, false);
    Ok(())
}

pub async fn cmd_friend_add(app: &App, user: UserId) -> anyhow::Result<()> {
    app.require_login().await?;
    let view = PublicProfileView::load(app.api(), user).await?;
    if view.is_friend() {
        println!("You are already friends with {}.", view.profile.username);
        return Ok(());
    }

    let result = view.send_friend_request().await;
    app.flush_events();
    result?;
    Ok(())
}

pub async fn cmd_friend_accept(app: &App, request_id: u64) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = OwnProfileView::load(app.api()).await?;
    let result = view.accept(request_id).await;
    app.flush_events();
    result?;
    Ok(())
}

pub async fn cmd_friend_decline(app: &App, request_id: u64) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = OwnProfileView::load(app.api()).await?;
    let result = view.decline(request_id).await;
    app.flush_events();
    result?;
    Ok(())
}

pub async fn cmd_friend_cancel(app: &App, request_id: u64) -> anyhow::Result<()> {
    app.require_login().await?;
    app.api().cancel_friend_request(request_id).await?;
    println!("✓ Friend request #{request_id} cancelled");
    Ok(())
}

pub async fn cmd_friend_remove(app: &App, user: UserId) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = OwnProfileView::load(app.api()).await?;
    let result = view.unfriend(user).await;
    app.flush_events();
    result?;
    Ok(())
}

pub async fn cmd_follow(app: &App, user: UserId) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = PublicProfileView::load(app.api(), user).await?;
    if view.is_self() {
        println!("You cannot follow yourself.");
        return Ok(());
    }
    let result = view.follow().await;
    app.flush_events();
    result?;
    Ok(())
}

pub async fn cmd_unfollow(app: &App, user: UserId) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = PublicProfileView::load(app.api(), user).await?;
    let result = view.unfollow().await;
    app.flush_events();
    result?;
    Ok(())
}

pub async fn cmd_followers(app: &App, user: Option<UserId>) -> anyhow::Result<()> {
    let me = app.require_login().await?;
    let list = app.api().followers(user.unwrap_or(me.id)).await?;
    print_people(&format!("{}'s followers", list.username), &list.followers);
    Ok(())
}

pub async fn cmd_following(app: &App, user: Option<UserId>) -> anyhow::Result<()> {
    let me = app.require_login().await?;
    let list = app.api().following(user.unwrap_or(me.id)).await?;
    print_people(&format!("{} follows", list.username), &list.following);
    Ok(())
}
