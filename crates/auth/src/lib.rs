//! Session tokens for the Reelhouse API
//!
//! Provides token issuance and verification, the revocation denylist, a
//! per-user throttle, and axum extractors that work with any domain state
//! implementing `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod credentials;
mod error;
mod extractors;
mod store;
mod throttle;
mod token;

pub use backend::AuthBackend;
pub use claims::{Role, TokenPayload, TokenType};
pub use config::AuthConfig;
pub use credentials::{parse_basic, parse_bearer};
pub use error::AuthError;
pub use extractors::{AdminUser, AuthUser, BasicCredentials, MaybeUser, RefreshUser};
pub use store::{MokaTokenStore, StoreError, TokenStore};
pub use throttle::{Throttle, ThrottleTicket};
pub use token::TokenService;
