//! Token issuance and verification
//!
//! Access and refresh tokens are HS256 JWTs signed with independent
//! secrets. Verification reports failures in a fixed order: unparsable,
//! wrong type, expired, bad signature. Expiry is judged on the payload
//! before the signature is checked.

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::claims::{Role, TokenPayload, TokenType};
use crate::config::AuthConfig;
use crate::error::AuthError;

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl Keys {
    fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }
}

/// Stateless token issuer/verifier
#[derive(Clone)]
pub struct TokenService {
    access: Keys,
    refresh: Keys,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: Keys::new(&config.access_token_secret, config.access_token_ttl_secs),
            refresh: Keys::new(&config.refresh_token_secret, config.refresh_token_ttl_secs),
        }
    }

    fn keys(&self, token_type: TokenType) -> &Keys {
        match token_type {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        }
    }

    /// Issue a signed token for `subject`.
    pub fn issue(&self, subject: Uuid, role: Role, is_refresh: bool) -> Result<String, AuthError> {
        self.issue_at(subject, role, is_refresh, Utc::now().timestamp())
    }

    pub(crate) fn issue_at(
        &self,
        subject: Uuid,
        role: Role,
        is_refresh: bool,
        now: i64,
    ) -> Result<String, AuthError> {
        let token_type = TokenType::from_refresh_flag(is_refresh);
        let keys = self.keys(token_type);

        let payload = TokenPayload {
            sub: subject,
            role,
            token_type,
            iat: now,
            exp: now + keys.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &payload, &keys.encoding).map_err(|e| {
            tracing::error!(error = %e, user_id = %subject, "Failed to sign token");
            AuthError::TokenIssueFailed
        })
    }

    /// Verify a token of the expected class and return its payload.
    pub fn verify(&self, token: &str, expect_refresh: bool) -> Result<TokenPayload, AuthError> {
        self.verify_at(token, expect_refresh, Utc::now().timestamp())
    }

    pub(crate) fn verify_at(
        &self,
        token: &str,
        expect_refresh: bool,
        now: i64,
    ) -> Result<TokenPayload, AuthError> {
        let expected = TokenType::from_refresh_flag(expect_refresh);
        let unverified = Self::decode_unverified(token)?;

        if unverified.token_type != expected {
            return Err(AuthError::WrongTokenType);
        }

        if unverified.is_expired_at(now) {
            return Err(AuthError::Expired);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let data = decode::<TokenPayload>(token, &self.keys(expected).decoding, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token verification failed");
                match e.kind() {
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::MalformedToken,
                }
            })?;

        Ok(data.claims)
    }

    /// Decode a token's payload without checking its signature or expiry.
    ///
    /// Only for revocation and type dispatch; never trust the result.
    pub fn decode_unverified(token: &str) -> Result<TokenPayload, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;

        decode::<TokenPayload>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token could not be decoded");
                AuthError::MalformedToken
            })
    }
}
