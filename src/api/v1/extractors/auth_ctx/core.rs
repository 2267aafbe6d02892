use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::AccessDenied;
use crate::state::AppState;

use super::AuthCtx;

/// Extractor for `AuthCtx`.
///
/// Assumes the gate middleware already inserted it. Missing context means the
/// route is public (or the middleware is not wired), which is answered like a
/// request without credentials.
pub struct AuthCtxExtractor(pub AuthCtx);

impl FromRequestParts<AppState> for AuthCtxExtractor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(AuthCtxExtractor)
            .ok_or(AppError::AccessDenied(AccessDenied::NoCredential))
    }
}
