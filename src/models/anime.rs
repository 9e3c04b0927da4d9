use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MyAnimeList identity of a catalog title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MalId(pub i64);

impl fmt::Display for MalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeGenre {
    pub id: u64,
    pub name: String,
}

/// Catalog entry served by `anime/all/` and `anime/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anime {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub mal_id: Option<MalId>,
    #[serde(default)]
    pub genres: Vec<AnimeGenre>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub episodes: Option<i32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub trailer_url: Option<String>,
}

impl Anime {
    #[must_use]
    pub fn has_genre(&self, name: &str) -> bool {
        self.genres.iter().any(|g| g.name == name)
    }

    #[must_use]
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|g| g.name.as_str()).collect()
    }
}

/// Entry of the genre catalog (`anime/genres/`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub author: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: u64,
    pub anime: String,
    pub character: String,
    pub quote: String,
}

/// Disposition of a list entry. An entry is always exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListStatus {
    Watched,
    PlanToWatch,
}

impl ListStatus {
    /// Wire flags as `(watched, plan_to_watch)`.
    #[must_use]
    pub const fn flags(self) -> (bool, bool) {
        match self {
            Self::Watched => (true, false),
            Self::PlanToWatch => (false, true),
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Watched => Self::PlanToWatch,
            Self::PlanToWatch => Self::Watched,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Watched => "watched",
            Self::PlanToWatch => "plan to watch",
        }
    }
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ListStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "watched" | "w" => Ok(Self::Watched),
            "plan_to_watch" | "plan" | "ptw" | "p" => Ok(Self::PlanToWatch),
            other => Err(format!("unknown list status '{other}'")),
        }
    }
}

/// Body of `PUT users/anime/update/{mal_id}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub watched: bool,
    pub plan_to_watch: bool,
}

impl From<ListStatus> for StatusUpdate {
    fn from(status: ListStatus) -> Self {
        let (watched, plan_to_watch) = status.flags();
        Self {
            watched,
            plan_to_watch,
        }
    }
}

/// One row of a user's anime list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnime {
    pub id: u64,
    #[serde(default)]
    pub author: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub mal_id: Option<MalId>,
    #[serde(default)]
    watched: bool,
    #[serde(default)]
    plan_to_watch: bool,
    #[serde(default)]
    pub add_time: Option<DateTime<Utc>>,
}

impl UserAnime {
    /// Watched wins if a legacy row carries both flags.
    #[must_use]
    pub const fn status(&self) -> ListStatus {
        if self.watched {
            ListStatus::Watched
        } else {
            ListStatus::PlanToWatch
        }
    }

    pub fn set_status(&mut self, status: ListStatus) {
        (self.watched, self.plan_to_watch) = status.flags();
    }

    #[must_use]
    pub fn display_title(&self) -> String {
        match (&self.title, self.mal_id) {
            (Some(title), _) => title.clone(),
            (None, Some(mal_id)) => format!("Anime #{mal_id}"),
            (None, None) => format!("Entry #{}", self.id),
        }
    }
}

/// Body of `POST users/anime/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUserAnime {
    pub title: String,
    pub image_url: Option<String>,
    pub mal_id: Option<MalId>,
    pub watched: bool,
    pub plan_to_watch: bool,
}

impl NewUserAnime {
    #[must_use]
    pub fn from_anime(anime: &Anime, status: ListStatus) -> Self {
        let (watched, plan_to_watch) = status.flags();
        Self {
            title: anime.title.clone(),
            image_url: anime.image_url.clone(),
            mal_id: anime.mal_id,
            watched,
            plan_to_watch,
        }
    }
}

/// A "seen and rejected" record excluded from recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempDeletedAnime {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub mal_id: Option<MalId>,
    #[serde(default)]
    pub time_deleted: Option<DateTime<Utc>>,
}

/// Body of `POST users/anime/temp-deleted/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTempDeleted {
    pub title: String,
    pub mal_id: Option<MalId>,
    pub image_url: Option<String>,
}

impl From<&Anime> for NewTempDeleted {
    fn from(anime: &Anime) -> Self {
        Self {
            title: anime.title.clone(),
            mal_id: anime.mal_id,
            image_url: anime.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchSort {
    #[default]
    Popularity,
    Rating,
    Newest,
}

impl SearchSort {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Popularity => "popularity",
            Self::Rating => "rating",
            Self::Newest => "newest",
        }
    }
}

impl FromStr for SearchSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "popularity" | "popular" => Ok(Self::Popularity),
            "rating" | "score" => Ok(Self::Rating),
            "newest" | "new" => Ok(Self::Newest),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}
