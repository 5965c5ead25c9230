//! Axum extractors for authentication
//!
//! Generic over any state `S` where `AuthBackend: FromRef<S>`.
//! This is axum's idiomatic nested-state pattern.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::backend::AuthBackend;
use crate::claims::{Role, TokenPayload, TokenType};
use crate::credentials::{header_str, parse_basic, parse_bearer};
use crate::error::AuthError;

async fn bearer_payload<S>(
    parts: &Parts,
    state: &S,
    expected: TokenType,
) -> Result<Option<TokenPayload>, AuthError>
where
    AuthBackend: FromRef<S>,
{
    let Some(auth_header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = parse_bearer(header_str(auth_header)?)?;
    let backend = AuthBackend::from_ref(state);
    backend.authenticate(&token, expected).await.map(Some)
}

/// Authenticated user extractor (access token)
#[derive(Debug)]
pub struct AuthUser(pub TokenPayload);

impl<S> FromRequestParts<S> for AuthUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        bearer_payload(parts, state, TokenType::Access)
            .await?
            .map(AuthUser)
            .ok_or(AuthError::MissingAuthorization)
    }
}

/// Refresh-token holder, only accepted by the token rotation endpoint
#[derive(Debug)]
pub struct RefreshUser(pub TokenPayload);

impl<S> FromRequestParts<S> for RefreshUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        bearer_payload(parts, state, TokenType::Refresh)
            .await?
            .map(RefreshUser)
            .ok_or(AuthError::MissingAuthorization)
    }
}

/// Admin-role extractor.
///
/// Like `AuthUser` but rejects other roles with 403 FORBIDDEN.
#[derive(Debug)]
pub struct AdminUser(pub TokenPayload);

impl<S> FromRequestParts<S> for AdminUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let AuthUser(payload) = AuthUser::from_request_parts(parts, state).await?;

        if payload.role != Role::Admin {
            return Err(AuthError::Forbidden);
        }

        Ok(AdminUser(payload))
    }
}

/// Optional authentication for public endpoints.
///
/// An absent header yields `None`; a header that is present but invalid is
/// still rejected.
#[derive(Debug)]
pub struct MaybeUser(pub Option<TokenPayload>);

impl<S> FromRequestParts<S> for MaybeUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        bearer_payload(parts, state, TokenType::Access)
            .await
            .map(MaybeUser)
    }
}

/// `Authorization: Basic` credentials for register/login
#[derive(Debug)]
pub struct BasicCredentials {
    pub email: String,
    pub password: String,
}

impl<S> FromRequestParts<S> for BasicCredentials
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;

        let (email, password) = parse_basic(header_str(auth_header)?)?;
        Ok(BasicCredentials { email, password })
    }
}
