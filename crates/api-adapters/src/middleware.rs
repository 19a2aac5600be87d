//! Cross-cutting layers: request ids, tracing spans, CORS, compression, and
//! translation of error bodies.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_LANGUAGE, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::error::ApiError;
use crate::extract::{request_lang, USER_ID_HEADER};
use crate::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Rewrites the `error` field of [`ApiError`] responses in the caller's language.
pub async fn localize_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let lang = request_lang(request.headers(), &state.default_lang);
    let response = next.run(request).await;
    let Some(err) = response.extensions().get::<ApiError>().cloned() else {
        return response;
    };
    let message = state.translator.translate(&lang, err.key);
    (err.status, Json(err.body(message))).into_response()
}

pub fn cors_policy() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            CONTENT_LANGUAGE,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

pub fn set_request_id() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid)
}

pub fn propagate_request_id() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER))
}

pub fn compression() -> CompressionLayer {
    CompressionLayer::new()
}

/// One span per request, tagged with its request id.
pub fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "http",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
