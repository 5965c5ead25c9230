//! Authentication backend
//!
//! Combines the stateless `TokenService` with two injected `TokenStore`s:
//! the revocation denylist and the verified-token cache. They are kept
//! apart so that pressure on the cache can never push a denylist entry out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::claims::{Role, TokenPayload, TokenType};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::store::{MokaTokenStore, TokenStore};
use crate::token::TokenService;

const DENYLIST_PREFIX: &str = "BLOCK_TOKEN_";
const VERIFIED_PREFIX: &str = "TOKEN_";

/// Authentication backend shared by every domain state.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    tokens: TokenService,
    denylist: Arc<dyn TokenStore>,
    verified: Arc<dyn TokenStore>,
    cache_margin_secs: i64,
}

impl AuthBackend {
    pub fn new(
        config: &AuthConfig,
        denylist: Arc<dyn TokenStore>,
        verified: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            tokens: TokenService::new(config),
            denylist,
            verified,
            cache_margin_secs: config.cache_margin_secs,
        }
    }

    /// Backend on in-process moka stores: an unbounded denylist and a
    /// verified-token cache sized from the config
    pub fn in_memory(config: &AuthConfig) -> Self {
        Self::new(
            config,
            Arc::new(MokaTokenStore::unbounded()),
            Arc::new(MokaTokenStore::bounded(config.cache_capacity)),
        )
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Issue an access/refresh token pair
    pub fn issue_pair(&self, subject: Uuid, role: Role) -> Result<(String, String), AuthError> {
        Ok((
            self.tokens.issue(subject, role, false)?,
            self.tokens.issue(subject, role, true)?,
        ))
    }

    /// Deny a token until its natural expiry.
    ///
    /// The signature is not checked so that any token the caller holds can
    /// be withdrawn. Revoking twice simply rewrites the same entry.
    pub async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        let payload = TokenService::decode_unverified(token)?;

        let remaining = payload.remaining_millis(Utc::now().timestamp_millis());
        let ttl = Duration::from_millis(remaining.max(1) as u64);

        self.denylist
            .set(&denylist_key(token), payload.clone(), ttl)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to write token denylist entry");
                AuthError::StoreUnavailable
            })?;

        tracing::info!(
            user_id = %payload.sub,
            token_type = ?payload.token_type,
            ttl_ms = ttl.as_millis() as u64,
            "Token revoked"
        );

        Ok(true)
    }

    pub async fn is_revoked(&self, token: &str) -> Result<bool, AuthError> {
        let entry = self.denylist.get(&denylist_key(token)).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read token denylist");
            AuthError::StoreUnavailable
        })?;
        Ok(entry.is_some())
    }

    /// Authenticate a raw bearer token of the expected class.
    ///
    /// The denylist is consulted before any payload is trusted, cached or not.
    pub async fn authenticate(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<TokenPayload, AuthError> {
        if self.is_revoked(token).await? {
            return Err(AuthError::Revoked);
        }

        let now = Utc::now();

        if let Some(cached) = self.cached(token).await {
            if cached.token_type == expected && !cached.is_expired_at(now.timestamp()) {
                return Ok(cached);
            }
        }

        let payload = self
            .tokens
            .verify(token, expected == TokenType::Refresh)?;

        let cache_for = payload.remaining_millis(now.timestamp_millis())
            - self.cache_margin_secs.saturating_mul(1000);
        if cache_for > 0 {
            let ttl = Duration::from_millis(cache_for as u64);
            if let Err(e) = self
                .verified
                .set(&verified_key(token), payload.clone(), ttl)
                .await
            {
                // Best-effort: the next request just re-verifies
                tracing::warn!(error = %e, "Failed to cache verified token");
            }
        }

        Ok(payload)
    }

    async fn cached(&self, token: &str) -> Option<TokenPayload> {
        match self.verified.get(&verified_key(token)).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Verified-token cache unavailable");
                None
            }
        }
    }
}

fn denylist_key(token: &str) -> String {
    format!("{}{}", DENYLIST_PREFIX, token)
}

fn verified_key(token: &str) -> String {
    format!("{}{}", VERIFIED_PREFIX, token)
}
