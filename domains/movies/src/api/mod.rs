//! API layer for the movies domain
//!
//! Contains HTTP handlers, routes, and domain state definition.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::MoviesState;
pub use routes::routes;
