use tracing::debug;

use super::catalog::print_anime;
use super::{App, prompt, stdin_lines};
use crate::feed::FeedFilter;
use crate::models::ListStatus;
use crate::views::DiscoveryView;

const HELP: &str = "[w] watched  [p] plan to watch  [s] skip  [n] next  [q] quit";

pub async fn cmd_feed(app: &App, min_score: Option<f32>, genres: Vec<String>) -> anyhow::Result<()> {
    app.require_login().await?;

    let mut filter = FeedFilter::from(&app.config.feed);
    if let Some(min_score) = min_score {
        filter.min_score = min_score;
    }
    if !genres.is_empty() {
        filter.genres = genres;
    }

    let result = DiscoveryView::load(app.api(), filter).await;
    app.flush_events();
    let mut view = result?;

    println!("Welcome back, {}!", view.profile().username);
    for quote in view.quotes() {
        println!("  \"{}\" - {}", quote.quote, quote.character);
    }
    println!();

    let mut lines = stdin_lines();
    loop {
        let Some(anime) = view.current() else {
            println!("No more anime match your filters.");
            break;
        };
        println!("{:-<60}", "");
        print_anime(anime);
        if let Some(synopsis) = &anime.synopsis {
            println!();
            println!("{synopsis}");
        }
        println!("{} candidates left", view.feed().candidate_count());
        println!("{HELP}");

        let Some(input) = prompt(&mut lines, "> ").await? else {
            break;
        };

        let outcome = match input.trim() {
            "w" => view.like(ListStatus::Watched).await.map(|_| ()),
            "p" => view.like(ListStatus::PlanToWatch).await.map(|_| ()),
            "s" => view.skip().await.map(|_| ()),
            "n" => {
                view.next();
                Ok(())
            }
            "q" => break,
            other => {
                println!("Unknown choice '{other}'. {HELP}");
                Ok(())
            }
        };
        app.flush_events();

        if let Err(e) = outcome {
            debug!(error = %e, "Feed action failed");
            if e.is_unauthorized() {
                return Err(e.into());
            }
        }
    }

    Ok(())
}
