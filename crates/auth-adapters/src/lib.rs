//! # auth-adapters
//!
//! [`TokenAuthProvider`] implements the `AuthProvider` port: argon2 password
//! hashing, and HS256 tokens when built with the `auth-jwt` feature.
//!
//! Identity is normally established by the gateway in front of the API. In
//! [`AuthMode::Local`] the bearer value itself is taken as the user id, which
//! keeps development setups free of a token issuer.

mod password;

#[cfg(feature = "auth-jwt")]
mod jwt;

use async_trait::async_trait;
use chrono::Duration;
use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::User;
use domains::traits::{AuthProvider, TokenPair};

/// Message key for a missing or unusable identity.
pub const NOT_AUTHORIZED: &str = "NotAuthorized";

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Bearer tokens are HS256 JWTs carrying the user id in `id`.
    #[default]
    Gateway,
    /// The bearer value is the user id.
    Local,
}

pub struct TokenAuthProvider {
    mode: AuthMode,
    ttl: Duration,
    #[cfg(feature = "auth-jwt")]
    keys: jwt::Keys,
}

impl TokenAuthProvider {
    pub fn new(mode: AuthMode, secret: &[u8], ttl_hours: i64) -> Self {
        #[cfg(not(feature = "auth-jwt"))]
        let _ = secret;
        Self {
            mode,
            ttl: Duration::hours(ttl_hours),
            #[cfg(feature = "auth-jwt")]
            keys: jwt::Keys::new(secret),
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }
}

#[async_trait]
impl AuthProvider for TokenAuthProvider {
    async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || password::hash(&password))
            .await
            .map_err(|e| AppError::internal(format!("hashing task failed: {e}")))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let (password, hash) = (password.to_owned(), hash.to_owned());
        tokio::task::spawn_blocking(move || password::verify(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("verification task failed: {e}")))
    }

    fn issue_tokens(&self, user: &User) -> Result<TokenPair> {
        #[cfg(feature = "auth-jwt")]
        {
            jwt::issue(&self.keys, user, self.ttl)
        }
        #[cfg(not(feature = "auth-jwt"))]
        {
            let _ = (user, self.ttl);
            Err(AppError::internal("built without auth-jwt: cannot sign tokens"))
        }
    }

    fn identify(&self, bearer: &str) -> Result<Uuid> {
        let bearer = bearer.trim();
        match self.mode {
            AuthMode::Local => Uuid::parse_str(bearer).map_err(|_| {
                tracing::warn!("local bearer is not a user id");
                AppError::Forbidden(NOT_AUTHORIZED)
            }),
            #[cfg(feature = "auth-jwt")]
            AuthMode::Gateway => jwt::identify(&self.keys, bearer),
            #[cfg(not(feature = "auth-jwt"))]
            AuthMode::Gateway => Err(AppError::Forbidden(NOT_AUTHORIZED)),
        }
    }
}
