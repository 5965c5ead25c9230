//! HTTP handlers for the movies domain

pub mod likes;
pub mod movies;
