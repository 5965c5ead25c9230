//! Domain entities for the movies domain

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reelhouse_common::{ColumnKind, SortColumn};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Columns a movie listing may be ordered by.
///
/// Names are the serialized field names of `MovieSummary`, so a cursor can
/// be cut from any returned row.
pub const MOVIE_SORT_COLUMNS: &[SortColumn] = &[
    SortColumn::new("id", "id", ColumnKind::Integer),
    SortColumn::new("likeCount", "like_count", ColumnKind::Integer),
    SortColumn::new("dislikeCount", "dislike_count", ColumnKind::Integer),
    SortColumn::new("title", "title", ColumnKind::Text),
    SortColumn::new("createdAt", "created_at", ColumnKind::Timestamp),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Director {
    pub id: i64,
    pub name: String,
    pub nationality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Movie as it appears in listings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub director: Director,
    pub genres: Vec<Genre>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The caller's own reaction: `true` liked, `false` disliked. Always
    /// `null` for anonymous callers.
    pub like_status: Option<bool>,
}

/// Fill in `like_status` from the caller's reactions, keyed by movie id
pub fn apply_like_statuses(movies: &mut [MovieSummary], statuses: &HashMap<i64, bool>) {
    for movie in movies {
        movie.like_status = statuses.get(&movie.id).copied();
    }
}

/// Movie with its long-form description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: MovieSummary,
    pub detail: String,
}

/// Listing filter; the title matches as a case-insensitive substring
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub title: Option<String>,
}

impl MovieFilter {
    /// `ILIKE` pattern with the caller's wildcards escaped
    pub fn title_pattern(&self) -> Option<String> {
        let title = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;

        let mut escaped = String::with_capacity(title.len() + 2);
        escaped.push('%');
        for c in title.chars() {
            if matches!(c, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped.push('%');
        Some(escaped)
    }
}

/// Partial update of a movie; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MovieChanges {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub detail: Option<String>,

    pub director_id: Option<i64>,

    #[validate(length(min = 1))]
    pub genre_ids: Option<Vec<i64>>,
}

impl MovieChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.detail.is_none()
            && self.director_id.is_none()
            && self.genre_ids.is_none()
    }

    /// Requested genre ids, sorted and without duplicates
    pub fn unique_genre_ids(&self) -> Option<Vec<i64>> {
        self.genre_ids.as_ref().map(|ids| {
            let mut ids = ids.clone();
            ids.sort_unstable();
            ids.dedup();
            ids
        })
    }
}

/// What pressing like (or dislike) does to the caller's current reaction.
///
/// Pressing the same button twice withdraws the reaction; pressing the other
/// one flips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeChange {
    Insert(bool),
    Flip(bool),
    Remove(bool),
}

impl LikeChange {
    pub fn resolve(current: Option<bool>, is_like: bool) -> Self {
        match current {
            None => LikeChange::Insert(is_like),
            Some(existing) if existing == is_like => LikeChange::Remove(is_like),
            Some(_) => LikeChange::Flip(is_like),
        }
    }

    /// Reaction left in place afterwards
    pub fn status(&self) -> Option<bool> {
        match *self {
            LikeChange::Insert(is_like) | LikeChange::Flip(is_like) => Some(is_like),
            LikeChange::Remove(_) => None,
        }
    }

    /// Adjustment to `(like_count, dislike_count)`
    pub fn count_deltas(&self) -> (i64, i64) {
        let unit = |is_like: bool| if is_like { (1, 0) } else { (0, 1) };
        match *self {
            LikeChange::Insert(is_like) => unit(is_like),
            LikeChange::Remove(is_like) => {
                let (likes, dislikes) = unit(is_like);
                (-likes, -dislikes)
            }
            LikeChange::Flip(is_like) => {
                let (likes, dislikes) = unit(is_like);
                (likes - dislikes, dislikes - likes)
            }
        }
    }
}
