//! Like / dislike toggles
//!
//! - POST /movies/{id}/like
//! - POST /movies/{id}/dislike
//!
//! Pressing the same button twice withdraws the reaction, pressing the other
//! one flips it. The movie's counters move in the same transaction.

use axum::{
    extract::{Path, State},
    Json,
};
use reelhouse_auth::AuthUser;
use reelhouse_common::{Error, RepositoryError, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::MoviesState;
use crate::domain::entities::LikeChange;
use crate::repository::transactions as tx_ops;

/// The caller's reaction after the toggle; `null` once withdrawn
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub is_like: Option<bool>,
}

/// POST /movies/{id}/like
pub async fn like_movie(
    State(state): State<MoviesState>,
    AuthUser(user): AuthUser,
    Path(movie_id): Path<i64>,
) -> Result<Json<LikeResponse>> {
    toggle(&state, movie_id, user.sub, true).await
}

/// POST /movies/{id}/dislike
pub async fn dislike_movie(
    State(state): State<MoviesState>,
    AuthUser(user): AuthUser,
    Path(movie_id): Path<i64>,
) -> Result<Json<LikeResponse>> {
    toggle(&state, movie_id, user.sub, false).await
}

async fn toggle(
    state: &MoviesState,
    movie_id: i64,
    user_id: Uuid,
    is_like: bool,
) -> Result<Json<LikeResponse>> {
    let mut tx = state
        .repos
        .begin()
        .await
        .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

    tx_ops::lock_movie_tx(&mut tx, movie_id).await?;

    let user_exists = tx_ops::user_exists_tx(&mut tx, user_id)
        .await
        .map_err(RepositoryError::from)?;
    if !user_exists {
        return Err(Error::Authentication("User no longer exists".to_string()));
    }

    let current = tx_ops::lock_like_tx(&mut tx, movie_id, user_id)
        .await
        .map_err(RepositoryError::from)?;
    let change = LikeChange::resolve(current, is_like);

    tx_ops::apply_like_change_tx(&mut tx, movie_id, user_id, change)
        .await
        .map_err(RepositoryError::from)?;

    tx.commit()
        .await
        .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::debug!(movie_id, user_id = %user_id, ?change, "Movie reaction toggled");

    Ok(Json(LikeResponse {
        is_like: change.status(),
    }))
}
