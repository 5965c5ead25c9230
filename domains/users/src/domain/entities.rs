//! Domain entities for the users domain

use chrono::{DateTime, Utc};
use reelhouse_auth::Role;
use reelhouse_common::{Error, Result};
use serde::Serialize;
use uuid::Uuid;
use validator::ValidateEmail;

/// Maximum accepted password length; argon2 input is otherwise unbounded
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credentials for a registration, checked before anything is hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
}

impl NewUser {
    pub fn new(email: &str, password: &str) -> Result<Self> {
        let email = email.trim().to_lowercase();

        if !email.validate_email() {
            return Err(Error::Validation("Invalid email format".to_string()));
        }

        if password.is_empty() || password.len() > MAX_PASSWORD_LENGTH {
            return Err(Error::Validation(format!(
                "Password must be 1-{} characters",
                MAX_PASSWORD_LENGTH
            )));
        }

        Ok(Self {
            email,
            password: password.to_string(),
        })
    }
}
