//! Request extractors that reject with [`ApiError`] instead of axum's plain
//! text rejections.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::{AUTHORIZATION, CONTENT_LANGUAGE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use domains::UserContext;

use crate::error::{ApiError, INVALID_JSON, INVALID_PAYLOAD};
use crate::state::AppState;

/// Identity set by the gateway in front of the API. Ignored unless
/// [`AppState::trust_user_header`] is set.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller and their language.
#[derive(Debug, Clone)]
pub struct Caller(pub UserContext);

/// `Content-Language`, or the configured default.
pub fn request_lang(headers: &HeaderMap, default: &str) -> String {
    headers
        .get(CONTENT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let lang = request_lang(&parts.headers, &state.default_lang);

        if let Some(raw) = parts.headers.get(USER_ID_HEADER).filter(|_| state.trust_user_header) {
            let user_id = raw
                .to_str()
                .ok()
                .and_then(|v| Uuid::parse_str(v.trim()).ok())
                .ok_or_else(|| ApiError::not_authorized("x-user-id is not a user id"))?;
            return Ok(Self(UserContext::new(user_id, lang)));
        }

        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                tracing::warn!(uri = %parts.uri, "request without identity");
                ApiError::not_authorized("missing bearer token")
            })?;
        let user_id = state
            .auth
            .identify(bearer)
            .map_err(|_| ApiError::not_authorized("bearer token could not be validated"))?;
        Ok(Self(UserContext::new(user_id, lang)))
    }
}

/// JSON body; malformed payloads become `400 InvalidJson`.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

// Syntax, schema and content-type failures all answer 400.
fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(INVALID_JSON, rejection.body_text())
}

/// A `{id}` path segment that must be a UUID.
pub struct PathId(pub Uuid);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    ApiError::bad_request(INVALID_PAYLOAD, rejection.body_text())
}

/// Query string parameters; missing or malformed ones become `400 InvalidPayload`.
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection: QueryRejection| ApiError::bad_request(INVALID_PAYLOAD, rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn language_defaults_when_header_is_blank() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_lang(&headers, "fr"), "fr");
        headers.insert(CONTENT_LANGUAGE, HeaderValue::from_static(" "));
        assert_eq!(request_lang(&headers, "fr"), "fr");
        headers.insert(CONTENT_LANGUAGE, HeaderValue::from_static("en"));
        assert_eq!(request_lang(&headers, "fr"), "en");
    }
}
