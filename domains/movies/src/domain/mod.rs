//! Movies domain model

pub mod entities;
