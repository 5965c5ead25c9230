//! Movies domain state and auth backend integration

use crate::MoviesRepositories;
use axum::extract::FromRef;
use reelhouse_auth::{AuthBackend, Throttle};

/// Application state for the movies domain
#[derive(Clone)]
pub struct MoviesState {
    pub repos: MoviesRepositories,
    pub auth: AuthBackend,
    pub throttle: Throttle,
}

impl FromRef<MoviesState> for AuthBackend {
    fn from_ref(state: &MoviesState) -> Self {
        state.auth.clone()
    }
}
