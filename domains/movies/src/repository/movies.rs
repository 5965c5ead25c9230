//! Movie repository

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reelhouse_common::{KeysetQuery, Result};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::entities::{Director, Genre, MovieDetail, MovieFilter, MovieSummary};

const SUMMARY_COLUMNS: &str = "m.id, m.title, m.like_count, m.dislike_count, \
     m.created_at, m.updated_at, \
     d.id AS director_id, d.name AS director_name, d.nationality AS director_nationality";

const SUMMARY_FROM: &str = "FROM movies m JOIN directors d ON d.id = m.director_id";

#[derive(Debug, sqlx::FromRow)]
struct MovieRow {
    id: i64,
    title: String,
    like_count: i64,
    dislike_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    director_id: i64,
    director_name: String,
    director_nationality: String,
}

impl MovieRow {
    fn into_summary(self, genres: Vec<Genre>) -> MovieSummary {
        MovieSummary {
            id: self.id,
            title: self.title,
            like_count: self.like_count,
            dislike_count: self.dislike_count,
            director: Director {
                id: self.director_id,
                name: self.director_name,
                nationality: self.director_nationality,
            },
            genres,
            created_at: self.created_at,
            updated_at: self.updated_at,
            like_status: None,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovieDetailRow {
    #[sqlx(flatten)]
    movie: MovieRow,
    detail: String,
}

#[derive(Debug, sqlx::FromRow)]
struct GenreLink {
    movie_id: i64,
    id: i64,
    name: String,
}

/// Start `... FROM movies m` with the title filter applied.
///
/// Returns the keyword the next predicate must be joined with.
fn push_filtered_from(
    qb: &mut QueryBuilder<'_, Postgres>,
    from: &str,
    filter: &MovieFilter,
) -> &'static str {
    qb.push(from);
    match filter.title_pattern() {
        Some(pattern) => {
            qb.push(" WHERE m.title ILIKE ");
            qb.push_bind(pattern);
            "AND"
        }
        None => "WHERE",
    }
}

/// One page of movies in keyset order
pub(crate) fn list_query(filter: &MovieFilter, page: &KeysetQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} ", SUMMARY_COLUMNS));
    let keyword = push_filtered_from(&mut qb, SUMMARY_FROM, filter);
    page.push_predicate(&mut qb, keyword, "m");
    page.push_order_and_limit(&mut qb, "m");
    qb
}

/// Total matching the filter, ignoring the cursor
pub(crate) fn count_query(filter: &MovieFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) ");
    push_filtered_from(&mut qb, "FROM movies m", filter);
    qb
}

#[derive(Clone)]
pub struct MovieRepository {
    pool: PgPool,
}

impl MovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List one keyset page and the total count for the same filter
    pub async fn list(
        &self,
        filter: &MovieFilter,
        page: &KeysetQuery,
    ) -> Result<(Vec<MovieSummary>, i64)> {
        let rows = list_query(filter, page)
            .build_query_as::<MovieRow>()
            .fetch_all(&self.pool)
            .await?;

        let count = count_query(filter)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut genres = self.genres_for(&ids).await?;

        let movies = rows
            .into_iter()
            .map(|row| {
                let movie_genres = genres.remove(&row.id).unwrap_or_default();
                row.into_summary(movie_genres)
            })
            .collect();

        Ok((movies, count))
    }

    /// Get a movie with its director, genres and detail
    pub async fn get(&self, id: i64) -> Result<Option<MovieDetail>> {
        let row = sqlx::query_as::<_, MovieDetailRow>(&format!(
            "SELECT {}, md.detail {} JOIN movie_details md ON md.id = m.detail_id WHERE m.id = $1",
            SUMMARY_COLUMNS, SUMMARY_FROM
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let genres = self
            .genres_for(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(Some(MovieDetail {
            movie: row.movie.into_summary(genres),
            detail: row.detail,
        }))
    }

    /// The user's reactions to the given movies; movies without one are absent
    pub async fn like_statuses(
        &self,
        user_id: Uuid,
        movie_ids: &[i64],
    ) -> Result<HashMap<i64, bool>> {
        if movie_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (i64, bool)>(
            "SELECT movie_id, is_like FROM movie_user_likes WHERE user_id = $1 AND movie_id = ANY($2)",
        )
        .bind(user_id)
        .bind(movie_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn genres_for(&self, movie_ids: &[i64]) -> Result<HashMap<i64, Vec<Genre>>> {
        if movie_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = sqlx::query_as::<_, GenreLink>(
            r#"
            SELECT mg.movie_id, g.id, g.name
            FROM movie_genres mg
            JOIN genres g ON g.id = mg.genre_id
            WHERE mg.movie_id = ANY($1)
            ORDER BY g.id
            "#,
        )
        .bind(movie_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_movie: HashMap<i64, Vec<Genre>> = HashMap::new();
        for link in links {
            by_movie.entry(link.movie_id).or_default().push(Genre {
                id: link.id,
                name: link.name,
            });
        }
        Ok(by_movie)
    }
}
