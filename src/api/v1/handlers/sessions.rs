/*
 * Responsibility
 * - POST /sessions/logout: 認証に使った token を失効させる
 * - protected ルートなので、ここに来た時点で token は検証済み
 */
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
};

use crate::{
    api::v1::extractors::AuthCtxExtractor,
    error::AppError,
    services::auth::{AccessDenied, bearer},
    state::AppState,
};

pub async fn logout(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer::extract(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    )
    .ok_or(AppError::AccessDenied(AccessDenied::NoCredential))?;

    state.gate.revoke(token).await?;
    tracing::info!(subject = %ctx.subject, "session terminated");

    Ok(StatusCode::NO_CONTENT)
}
