/*
 * Responsibility
 * - middleware / handler 共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - gate の拒否はすべて ACCESS_DENIED カテゴリ。`reason` で種類を区別し、
 *   `retryable` はそのまま再試行してよいものに付く
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::AccessDenied;
use crate::services::auth::revocation::RevocationError;

// Seconds a client should wait after an upstream failure.
const RETRY_AFTER_SECS: &str = "1";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),
    #[error("service unavailable")]
    Unavailable,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::AccessDenied(denied) => {
                let status = if denied.is_retryable() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::UNAUTHORIZED
                };
                let body = ErrorBody {
                    code: "ACCESS_DENIED",
                    reason: Some(denied.reason_code()),
                    message: denied.to_string(),
                    retryable: denied.is_retryable(),
                };
                (status, body)
            }
            AppError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    code: "SERVICE_UNAVAILABLE",
                    reason: None,
                    message: self.to_string(),
                    retryable: true,
                },
            ),
        };

        let retryable = body.retryable;
        let mut response = (status, Json(ErrorResponse { error: body })).into_response();

        let headers = response.headers_mut();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if retryable {
            headers.insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }

        response
    }
}

impl From<RevocationError> for AppError {
    fn from(e: RevocationError) -> Self {
        tracing::error!(error = %e, "revocation backend failure");
        AppError::Unavailable
    }
}
