//! # ApiError
//!
//! Maps [`AppError`] onto HTTP. The response body is
//! `{"detail": ..., "error": ..., "status": ...}` where `error` is the
//! caller-language message for the error key. Handlers return the untranslated
//! key; [`crate::middleware::localize_errors`] swaps in the translation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use domains::error::{AppError, ErrorKind};

pub const INVALID_JSON: &str = "InvalidJson";
pub const INVALID_PAYLOAD: &str = "InvalidPayload";
pub const ID_NOT_MATCHING: &str = "IdNotMatching";
pub const NOT_AUTHORIZED: &str = "NotAuthorized";
pub const INTERNAL_ERROR: &str = "InternalError";

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    /// Message catalog key.
    pub key: &'static str,
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    pub error: String,
    pub status: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, key: &'static str, detail: impl Into<String>) -> Self {
        Self { status, key, detail: detail.into() }
    }

    pub fn bad_request(key: &'static str, detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, key, detail)
    }

    pub fn not_authorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, NOT_AUTHORIZED, detail)
    }

    pub fn body(&self, message: String) -> ErrorBody {
        ErrorBody { detail: self.detail.clone(), error: message, status: self.status.as_u16() }
    }
}

pub fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::ValidationFailed | ErrorKind::UnknownSibling => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = status_of(err.kind());
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
            return Self::new(status, INTERNAL_ERROR, "internal service error");
        }
        tracing::debug!(error = %err, status = status.as_u16(), "request rejected");
        Self::new(status, err.message_key(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body(self.key.to_string());
        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}
