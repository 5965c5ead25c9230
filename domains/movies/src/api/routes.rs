//! Route definitions for the movies domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{likes, movies};
use super::middleware::MoviesState;

/// Path the listing throttle counts requests under
pub const MOVIES_PATH: &str = "/movies";

/// Create all movies domain API routes
pub fn routes() -> Router<MoviesState> {
    Router::new()
        .route(MOVIES_PATH, get(movies::list_movies))
        .route(
            "/movies/{id}",
            get(movies::get_movie).patch(movies::update_movie),
        )
        .route("/movies/{id}/like", post(likes::like_movie))
        .route("/movies/{id}/dislike", post(likes::dislike_movie))
}
