//! Token payload types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role carried in every token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Admin,
    PaidUser,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::PaidUser => write!(f, "paidUser"),
            Role::User => write!(f, "user"),
        }
    }
}

/// Token class; each class is signed with its own secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn from_refresh_flag(is_refresh: bool) -> Self {
        if is_refresh {
            TokenType::Refresh
        } else {
            TokenType::Access
        }
    }
}

/// Signed token payload. Never mutated after issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Subject (user ID)
    pub sub: Uuid,
    pub role: Role,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expires at (seconds since epoch)
    pub exp: i64,
}

impl TokenPayload {
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Milliseconds of validity left at `now_millis`, possibly negative
    pub fn remaining_millis(&self, now_millis: i64) -> i64 {
        self.exp.saturating_mul(1000) - now_millis
    }
}
