//! HS256 access and refresh tokens.
//!
//! The access token carries the user's id in the `id` claim, which is what
//! [`identify`] reads back. Refresh tokens only carry the timestamps.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::User;
use domains::traits::TokenPair;

const PROFILE: &str = "user";

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    id: String,
    email: String,
    firstname: String,
    lastname: String,
    profile: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    iat: i64,
    exp: i64,
}

pub(crate) struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    pub(crate) fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub(crate) fn issue(keys: &Keys, user: &User, ttl: Duration) -> Result<TokenPair> {
    let iat = Utc::now().timestamp();
    let exp = iat + ttl.num_seconds();
    let access = AccessClaims {
        id: user.id.to_string(),
        email: user.email.clone(),
        firstname: user.firstname.clone(),
        lastname: user.lastname.clone(),
        profile: PROFILE.to_string(),
        iat,
        exp,
    };
    let header = Header::new(Algorithm::HS256);
    let sign_err = |e: jsonwebtoken::errors::Error| AppError::internal(format!("token signing failed: {e}"));
    Ok(TokenPair {
        access_token: encode(&header, &access, &keys.encoding).map_err(sign_err)?,
        refresh_token: encode(&header, &RefreshClaims { iat, exp }, &keys.encoding).map_err(sign_err)?,
    })
}

/// Verifies signature and expiry, then parses the `id` claim.
pub(crate) fn identify(keys: &Keys, token: &str) -> Result<Uuid> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<AccessClaims>(token, &keys.decoding, &validation).map_err(|e| {
        tracing::warn!(error = %e, "rejected bearer token");
        AppError::Forbidden(crate::NOT_AUTHORIZED)
    })?;
    Uuid::parse_str(&data.claims.id).map_err(|_| AppError::Forbidden(crate::NOT_AUTHORIZED))
}
