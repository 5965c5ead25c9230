//! User profile API handlers
//!
//! - GET /users/me - Get current user profile

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use reelhouse_auth::{AuthUser, Role};
use reelhouse_common::{Error, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::UsersState;
use crate::User;

/// Response for user profile operations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// GET /users/me
pub async fn me(
    State(state): State<UsersState>,
    AuthUser(payload): AuthUser,
) -> Result<Json<UserResponse>> {
    let user = state
        .repos
        .users
        .get_by_id(payload.sub)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}
