use rand::SeedableRng;
use rand::rngs::StdRng;

use super::App;
use crate::feed::{QUOTE_COUNT, random_quotes};
use crate::models::{Anime, SearchSort};
use crate::views::SearchView;
use crate::views::search::SearchQuery;

pub(crate) fn print_anime(anime: &Anime) {
    let score = anime
        .score
        .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));
    let year = anime.year.map_or_else(|| "?".to_string(), |y| y.to_string());
    let mal = anime
        .mal_id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    println!("{} ({year})", anime.title);
    println!("  MAL: {mal} | Score: {score} | Genres: {}", anime.genre_names().join(", "));
}

pub async fn cmd_search(
    app: &App,
    query: &str,
    sort: SearchSort,
    genre: Option<String>,
) -> anyhow::Result<()> {
    app.require_login().await?;
    let mut view = SearchView::load(app.api()).await?;

    let query = SearchQuery {
        text: query.to_string(),
        sort,
        genre,
    };
    let results = view.search(&query).await?;

    if results.is_empty() {
        println!("No anime found for '{}'", query.text);
        return Ok(());
    }

    println!("Search results for '{}' ({} sorted by {})", query.text, results.len(), sort.as_str());
    println!("{:-<60}", "");
    for anime in results {
        print_anime(anime);
    }
    Ok(())
}

pub async fn cmd_genres(app: &App) -> anyhow::Result<()> {
    app.require_login().await?;
    let view = SearchView::load(app.api()).await?;

    println!("Genres ({} total)", view.genres().len());
    println!("{:-<60}", "");
    for genre in view.genres() {
        println!("  {}", genre.name);
    }
    Ok(())
}

pub async fn cmd_quotes(app: &App) -> anyhow::Result<()> {
    app.require_login().await?;
    let quotes = app.api().quotes().await?;

    let mut rng = StdRng::from_os_rng();
    for quote in random_quotes(&quotes, QUOTE_COUNT, &mut rng) {
        println!("\"{}\"", quote.quote);
        println!("  - {} ({})", quote.character, quote.anime);
        println!();
    }
    Ok(())
}
