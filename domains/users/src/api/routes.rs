//! Route definitions for the users domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{auth, users};
use super::middleware::UsersState;

/// Create credential and token routes
fn auth_routes() -> Router<UsersState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/token/block", post(auth::block_token))
        .route("/auth/token/access", post(auth::rotate_access_token))
}

/// Create user profile routes
fn user_routes() -> Router<UsersState> {
    Router::new().route("/users/me", get(users::me))
}

/// Create all users domain API routes
pub fn routes() -> Router<UsersState> {
    Router::new().merge(auth_routes()).merge(user_routes())
}
