//! Transactional free functions for the movies domain
//!
//! Callers own the transaction; dropping it without `commit` rolls back.

use reelhouse_common::RepositoryError;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entities::LikeChange;

/// Lock a movie row for update and return its detail row id.
pub async fn lock_movie_tx(
    transaction: &mut Transaction<'_, Postgres>,
    movie_id: i64,
) -> std::result::Result<i64, RepositoryError> {
    sqlx::query_scalar::<_, i64>("SELECT detail_id FROM movies WHERE id = $1 FOR UPDATE")
        .bind(movie_id)
        .fetch_optional(&mut **transaction)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Movie {}", movie_id)))
}

pub async fn ensure_director_exists_tx(
    transaction: &mut Transaction<'_, Postgres>,
    director_id: i64,
) -> std::result::Result<(), RepositoryError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM directors WHERE id = $1)",
    )
    .bind(director_id)
    .fetch_one(&mut **transaction)
    .await?;

    if !exists {
        return Err(RepositoryError::NotFound(format!("Director {}", director_id)));
    }
    Ok(())
}

/// Subset of `genre_ids` that exist, in ascending order.
pub async fn find_existing_genre_ids_tx(
    transaction: &mut Transaction<'_, Postgres>,
    genre_ids: &[i64],
) -> std::result::Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM genres WHERE id = ANY($1) ORDER BY id")
        .bind(genre_ids)
        .fetch_all(&mut **transaction)
        .await
}

/// Update scalar movie columns; `None` keeps the current value.
///
/// A title already used by another movie is `AlreadyExists`.
pub async fn update_movie_tx(
    transaction: &mut Transaction<'_, Postgres>,
    movie_id: i64,
    title: Option<&str>,
    director_id: Option<i64>,
) -> std::result::Result<(), RepositoryError> {
    sqlx::query(
        r#"
        UPDATE movies SET
            title = COALESCE($2, title),
            director_id = COALESCE($3, director_id),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(movie_id)
    .bind(title)
    .bind(director_id)
    .execute(&mut **transaction)
    .await
    .map_err(|e| RepositoryError::from_unique_violation(e, "Movie title"))?;
    Ok(())
}

pub async fn update_detail_tx(
    transaction: &mut Transaction<'_, Postgres>,
    detail_id: i64,
    detail: &str,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("UPDATE movie_details SET detail = $2 WHERE id = $1")
        .bind(detail_id)
        .bind(detail)
        .execute(&mut **transaction)
        .await?;
    Ok(())
}

/// Replace a movie's genre set.
pub async fn replace_genres_tx(
    transaction: &mut Transaction<'_, Postgres>,
    movie_id: i64,
    genre_ids: &[i64],
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM movie_genres WHERE movie_id = $1")
        .bind(movie_id)
        .execute(&mut **transaction)
        .await?;

    sqlx::query(
        "INSERT INTO movie_genres (movie_id, genre_id) SELECT $1, UNNEST($2::BIGINT[])",
    )
    .bind(movie_id)
    .bind(genre_ids)
    .execute(&mut **transaction)
    .await?;
    Ok(())
}

pub async fn user_exists_tx(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> std::result::Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(&mut **transaction)
        .await
}

/// The user's current reaction to a movie, locked until the transaction ends.
pub async fn lock_like_tx(
    transaction: &mut Transaction<'_, Postgres>,
    movie_id: i64,
    user_id: Uuid,
) -> std::result::Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT is_like FROM movie_user_likes WHERE movie_id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(movie_id)
    .bind(user_id)
    .fetch_optional(&mut **transaction)
    .await
}

/// Write a like toggle and keep the movie's counters in step with it.
///
/// The movie row must already be locked by `lock_movie_tx`.
pub async fn apply_like_change_tx(
    transaction: &mut Transaction<'_, Postgres>,
    movie_id: i64,
    user_id: Uuid,
    change: LikeChange,
) -> std::result::Result<(), sqlx::Error> {
    match change {
        LikeChange::Insert(is_like) => {
            sqlx::query(
                "INSERT INTO movie_user_likes (movie_id, user_id, is_like) VALUES ($1, $2, $3)",
            )
            .bind(movie_id)
            .bind(user_id)
            .bind(is_like)
            .execute(&mut **transaction)
            .await?;
        }
        LikeChange::Flip(is_like) => {
            sqlx::query(
                "UPDATE movie_user_likes SET is_like = $3 WHERE movie_id = $1 AND user_id = $2",
            )
            .bind(movie_id)
            .bind(user_id)
            .bind(is_like)
            .execute(&mut **transaction)
            .await?;
        }
        LikeChange::Remove(_) => {
            sqlx::query("DELETE FROM movie_user_likes WHERE movie_id = $1 AND user_id = $2")
                .bind(movie_id)
                .bind(user_id)
                .execute(&mut **transaction)
                .await?;
        }
    }

    let (likes, dislikes) = change.count_deltas();
    sqlx::query(
        r#"
        UPDATE movies SET
            like_count = like_count + $2,
            dislike_count = dislike_count + $3
        WHERE id = $1
        "#,
    )
    .bind(movie_id)
    .bind(likes)
    .bind(dislikes)
    .execute(&mut **transaction)
    .await?;
    Ok(())
}
