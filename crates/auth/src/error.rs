//! Authentication errors
//!
//! Every token failure that could help an attacker probe signatures or
//! expiry produces the same client-facing body; the precise cause is only
//! logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reelhouse_common::Error;
use serde_json::json;

/// Authentication error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthorization,
    /// Malformed `Basic`/`Bearer` header
    #[error("malformed credential")]
    BadFormat,
    #[error("token cannot be parsed")]
    MalformedToken,
    #[error("token has the wrong type")]
    WrongTokenType,
    #[error("token expired")]
    Expired,
    #[error("token signature invalid")]
    InvalidSignature,
    #[error("token revoked")]
    Revoked,
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("insufficient role")]
    Forbidden,
    #[error("request limit exceeded")]
    ThrottleExceeded,
    #[error("token store unavailable")]
    StoreUnavailable,
    #[error("token could not be issued")]
    TokenIssueFailed,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::BadFormat | AuthError::MalformedToken => StatusCode::BAD_REQUEST,
            AuthError::MissingAuthorization
            | AuthError::WrongTokenType
            | AuthError::Expired
            | AuthError::InvalidSignature
            | AuthError::Revoked
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::ThrottleExceeded => StatusCode::TOO_MANY_REQUESTS,
            AuthError::StoreUnavailable | AuthError::TokenIssueFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code_and_message(&self) -> (&'static str, &'static str) {
        match self {
            AuthError::MissingAuthorization => {
                ("MISSING_AUTHORIZATION", "Authorization header required")
            }
            AuthError::BadFormat | AuthError::MalformedToken => (
                "INVALID_AUTHORIZATION",
                "Invalid authorization header format",
            ),
            AuthError::WrongTokenType
            | AuthError::Expired
            | AuthError::InvalidSignature
            | AuthError::Revoked => ("INVALID_TOKEN", "Invalid or expired token"),
            AuthError::InvalidCredentials => ("INVALID_CREDENTIALS", "Invalid login credentials"),
            AuthError::Forbidden => ("FORBIDDEN", "Insufficient permissions"),
            AuthError::ThrottleExceeded => ("RATE_LIMIT_EXCEEDED", "Too many requests"),
            AuthError::StoreUnavailable | AuthError::TokenIssueFailed => {
                ("AUTH_ERROR", "Authentication failed")
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = self.code_and_message();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Authentication backend failure");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        let (_, message) = err.code_and_message();
        let message = message.to_string();
        match err.status_code() {
            StatusCode::BAD_REQUEST => Error::Validation(message),
            StatusCode::UNAUTHORIZED => Error::Authentication(message),
            StatusCode::FORBIDDEN => Error::Authorization(message),
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimit(message),
            _ => Error::Internal(err.to_string()),
        }
    }
}
