//! Movies domain: keyset-paginated catalogue, detail, likes and admin updates

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use repository::{
    apply_like_change_tx, ensure_director_exists_tx, find_existing_genre_ids_tx, lock_like_tx,
    lock_movie_tx, replace_genres_tx, update_detail_tx, update_movie_tx, user_exists_tx,
    MovieRepository, MoviesRepositories,
};

// Re-export API types
pub use api::routes;
pub use api::MoviesState;
