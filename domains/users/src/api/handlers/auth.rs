//! Credential and token API handlers
//!
//! Implements:
//! - POST /auth/register - Create an account from `Basic` credentials
//! - POST /auth/login - Exchange `Basic` credentials for a token pair
//! - POST /auth/token/block - Revoke a token until it expires
//! - POST /auth/token/access - Issue a fresh access token from a refresh token

use axum::{extract::State, http::StatusCode, Json};
use reelhouse_auth::{AuthError, AuthUser, BasicCredentials, RefreshUser};
use reelhouse_common::{hash_password, verify_password, Error, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::handlers::users::UserResponse;
use crate::api::middleware::UsersState;
use crate::domain::entities::NewUser;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Request for revoking a token
#[derive(Debug, Deserialize, Validate)]
pub struct BlockTokenRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<UsersState>,
    credentials: BasicCredentials,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let new_user = NewUser::new(&credentials.email, &credentials.password)?;

    if state
        .repos
        .users
        .find_by_email(&new_user.email)
        .await?
        .is_some()
    {
        return Err(Error::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(&new_user.password)?;
    let user = state
        .repos
        .users
        .create(&new_user.email, &password_hash)
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<UsersState>,
    credentials: BasicCredentials,
) -> Result<Json<TokenPairResponse>> {
    let email = credentials.email.trim().to_lowercase();

    let user = state
        .repos
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&credentials.password, &user.password_hash) {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(AuthError::InvalidCredentials.into());
    }

    let (access_token, refresh_token) = state.auth.issue_pair(user.id, user.role)?;

    Ok(Json(TokenPairResponse {
        access_token,
        refresh_token,
    }))
}

/// POST /auth/token/block
pub async fn block_token(
    State(state): State<UsersState>,
    AuthUser(caller): AuthUser,
    ValidatedJson(request): ValidatedJson<BlockTokenRequest>,
) -> Result<Json<bool>> {
    let revoked = state.auth.revoke(&request.token).await?;

    tracing::info!(caller_id = %caller.sub, "Token blocked on request");

    Ok(Json(revoked))
}

/// POST /auth/token/access
pub async fn rotate_access_token(
    State(state): State<UsersState>,
    RefreshUser(payload): RefreshUser,
) -> Result<Json<AccessTokenResponse>> {
    let access_token = state.auth.tokens().issue(payload.sub, payload.role, false)?;

    Ok(Json(AccessTokenResponse { access_token }))
}
