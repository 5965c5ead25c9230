//! Repository implementations for the movies domain

pub mod movies;
pub mod transactions;

use sqlx::{PgPool, Postgres, Transaction};

pub use movies::MovieRepository;
pub use transactions::{
    apply_like_change_tx, ensure_director_exists_tx, find_existing_genre_ids_tx, lock_like_tx,
    lock_movie_tx, replace_genres_tx, update_detail_tx, update_movie_tx, user_exists_tx,
};

/// Combined repository access for the movies domain
#[derive(Clone)]
pub struct MoviesRepositories {
    pool: PgPool,
    pub movies: MovieRepository,
}

impl MoviesRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            movies: MovieRepository::new(pool.clone()),
            pool,
        }
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}
