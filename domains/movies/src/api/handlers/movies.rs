//! Movie API handlers
//!
//! - GET /movies - Keyset-paginated listing (throttled per user)
//! - GET /movies/{id} - Movie detail
//! - PATCH /movies/{id} - Transactional update (admin only)
//!
//! Authenticated callers also see their own `likeStatus` on every movie.

use axum::{
    extract::{Path, State},
    Json,
};
use reelhouse_auth::{AdminUser, MaybeUser};
use reelhouse_common::{
    CursorPagination, Error, KeysetQuery, RepositoryError, Result, ValidatedJson, ValidatedQuery,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::MoviesState;
use crate::api::routes::MOVIES_PATH;
use crate::domain::entities::{
    apply_like_statuses, MovieChanges, MovieDetail, MovieFilter, MovieSummary, MOVIE_SORT_COLUMNS,
};
use crate::repository::transactions as tx_ops;

/// Query string of `GET /movies`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListMoviesQuery {
    #[validate(length(max = 255))]
    pub title: Option<String>,
    pub cursor: Option<String>,
    /// Comma-separated `<column>_<ASC|DESC>` terms
    pub order: Option<String>,
    pub take: Option<i64>,
}

impl ListMoviesQuery {
    fn split(self) -> (MovieFilter, CursorPagination) {
        (
            MovieFilter { title: self.title },
            CursorPagination {
                cursor: self.cursor,
                order: self.order,
                take: self.take,
            },
        )
    }
}

/// One page of movies
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePage {
    pub data: Vec<MovieSummary>,
    pub next_cursor: Option<String>,
    pub count: i64,
}

/// Decorate movies with the caller's reactions; anonymous callers get none.
async fn attach_like_statuses(
    state: &MoviesState,
    caller: Option<Uuid>,
    movies: &mut [MovieSummary],
) -> Result<()> {
    let Some(user_id) = caller else {
        return Ok(());
    };

    let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();
    let statuses = state.repos.movies.like_statuses(user_id, &ids).await?;
    apply_like_statuses(movies, &statuses);
    Ok(())
}

/// GET /movies
pub async fn list_movies(
    State(state): State<MoviesState>,
    MaybeUser(caller): MaybeUser,
    ValidatedQuery(query): ValidatedQuery<ListMoviesQuery>,
) -> Result<Json<MoviePage>> {
    let ticket = match &caller {
        Some(payload) => Some(state.throttle.admit("GET", MOVIES_PATH, payload.sub)?),
        None => None,
    };

    let (filter, pagination) = query.split();
    let page = KeysetQuery::prepare(MOVIE_SORT_COLUMNS, &pagination)?;

    if let Some(predicate) = page.describe() {
        tracing::debug!(%predicate, take = page.take(), "Continuing movie listing");
    }

    let (mut data, count) = state.repos.movies.list(&filter, &page).await?;
    let next_cursor = page.next_cursor(&data)?;
    attach_like_statuses(&state, caller.as_ref().map(|p| p.sub), &mut data).await?;

    if let Some(ticket) = ticket {
        ticket.commit();
    }

    Ok(Json(MoviePage {
        data,
        next_cursor,
        count,
    }))
}

/// GET /movies/{id}
pub async fn get_movie(
    State(state): State<MoviesState>,
    MaybeUser(caller): MaybeUser,
    Path(movie_id): Path<i64>,
) -> Result<Json<MovieDetail>> {
    let mut movie = state
        .repos
        .movies
        .get(movie_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Movie {} not found", movie_id)))?;

    attach_like_statuses(
        &state,
        caller.map(|p| p.sub),
        std::slice::from_mut(&mut movie.movie),
    )
    .await?;

    Ok(Json(movie))
}

/// PATCH /movies/{id}
///
/// Every change lands in one transaction; any failure leaves the movie as
/// it was.
pub async fn update_movie(
    State(state): State<MoviesState>,
    AdminUser(admin): AdminUser,
    Path(movie_id): Path<i64>,
    ValidatedJson(changes): ValidatedJson<MovieChanges>,
) -> Result<Json<MovieDetail>> {
    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    let detail_id = tx_ops::lock_movie_tx(&mut tx, movie_id).await?;

    if let Some(director_id) = changes.director_id {
        tx_ops::ensure_director_exists_tx(&mut tx, director_id).await?;
    }

    let genre_ids = changes.unique_genre_ids();
    if let Some(requested) = &genre_ids {
        let existing = tx_ops::find_existing_genre_ids_tx(&mut tx, requested)
            .await
            .map_err(RepositoryError::from)?;

        if existing.len() != requested.len() {
            let missing: Vec<String> = requested
                .iter()
                .filter(|id| !existing.contains(id))
                .map(ToString::to_string)
                .collect();
            return Err(RepositoryError::NotFound(format!("Genres {}", missing.join(", "))).into());
        }
    }

    if changes.title.is_some() || changes.director_id.is_some() {
        tx_ops::update_movie_tx(&mut tx, movie_id, changes.title.as_deref(), changes.director_id)
            .await?;
    }

    if let Some(detail) = &changes.detail {
        tx_ops::update_detail_tx(&mut tx, detail_id, detail)
            .await
            .map_err(RepositoryError::from)?;
    }

    if let Some(genre_ids) = &genre_ids {
        tx_ops::replace_genres_tx(&mut tx, movie_id, genre_ids)
            .await
            .map_err(RepositoryError::from)?;
    }

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(
        movie_id,
        admin_id = %admin.sub,
        changed = !changes.is_empty(),
        "Movie updated"
    );

    let mut movie = state
        .repos
        .movies
        .get(movie_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Movie {} not found", movie_id)))?;

    attach_like_statuses(&state, Some(admin.sub), std::slice::from_mut(&mut movie.movie))
        .await?;

    Ok(Json(movie))
}
