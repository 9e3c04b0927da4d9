//! Anime list and skip history command handlers

use super::App;
use crate::models::{ListStatus, MalId, UserAnime, UserId};
use crate::views::{ListView, PublicListView};

fn print_entries(title: &str, entries: &[&UserAnime]) {
    println!("{title} ({} total)", entries.len());
    println!("{:-<70}", "");
    if entries.is_empty() {
        println!("  (empty)");
    }
    for entry in entries {
        let mal = entry
            .mal_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let added = entry
            .add_time
            .map_or_else(String::new, |t| format!(" | Added: {}", t.format("%Y-%m-%d")));
        println!("• {}", entry.display_title());
        println!("  ID: {} | MAL: {mal}{added}", entry.id);
    }
    println!();
}

fn print_split(name: &str, watched: &[&UserAnime], planned: &[&UserAnime], only: Option<ListStatus>) {
    if only.is_none_or(|s| s == ListStatus::Watched) {
        print_entries(&format!("{name} - watched"), watched);
    }
    if only.is_none_or(|s| s == ListStatus::PlanToWatch) {
        print_entries(&format!("{name} - plan to watch"), planned);
    }
}

pub async fn cmd_list_show(
    app: &App,
    status: Option<ListStatus>,
    user: Option<UserId>,
) -> anyhow::Result<()> {
    let me = app.require_login().await?;

    match user.filter(|id| *id != me.id) {
        Some(user) => {
            let view = PublicListView::load(app.api(), user).await?;
            if !view.profile.anime_list_public {
                println!("{}'s anime list is private.", view.profile.username);
                return Ok(());
            }
            print_split(
                &view.profile.username,
                &view.with_status(ListStatus::Watched),
                &view.with_status(ListStatus::PlanToWatch),
                status,
            );
        }
        None => {
            let view = ListView::load(app.api()).await?;
            print_split("Your list", &view.watched(), &view.plan_to_watch(), status);
            if view.entries().is_empty() {
                println!("Find something to watch with: anitinder feed");
            }
        }
    }
    Ok(())
}

pub async fn cmd_list_status(app: &App, mal_id: MalId, status: Option<ListStatus>) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = ListView::load(app.api()).await?;

    let result = match status {
        Some(status) => view.set_status(mal_id, status).await.map(|()| status),
        None => view.toggle_status(mal_id).await,
    };
    app.flush_events();
    let status = result?;

    if let Some(entry) = view.find(mal_id) {
        println!("{} is now: {status}", entry.display_title());
    }
    Ok(())
}

pub async fn cmd_list_remove(app: &App, id: u64) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = ListView::load(app.api()).await?;

    if !view.entries().iter().any(|e| e.id == id) {
        println!("No list entry with ID {id}. Use 'anitinder list' to see IDs.");
        return Ok(());
    }

    let result = view.remove(id).await;
    app.flush_events();
    result?;
    Ok(())
}

pub async fn cmd_list_add(app: &App, mal_id: MalId, status: ListStatus) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = ListView::load(app.api()).await?;

    let result = view.add(mal_id, status).await.map(|entry| entry.id);
    app.flush_events();
    let id = result?;
    println!("List entry ID: {id}");
    Ok(())
}

pub async fn cmd_skipped_list(app: &App) -> anyhow::Result<()> {
    app.require_login().await?;
    let view = ListView::load(app.api()).await?;

    println!("Skipped anime ({} total)", view.skipped().len());
    println!("{:-<70}", "");
    for record in view.skipped() {
        let when = record
            .time_deleted
            .map_or_else(String::new, |t| format!(" | Skipped: {}", t.format("%Y-%m-%d")));
        println!("• {}", record.title);
        println!("  ID: {}{when}", record.id);
    }
    Ok(())
}

pub async fn cmd_skipped_restore(app: &App, id: u64) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = ListView::load(app.api()).await?;

    let result = view.restore(id).await;
    app.flush_events();
    result?;
    Ok(())
}

pub async fn cmd_skipped_clear(app: &App) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = ListView::load(app.api()).await?;

    let result = view.clear_skipped().await;
    app.flush_events();
    result?;
    Ok(())
}
