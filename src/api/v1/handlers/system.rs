/*
 * Responsibility
 * - /system グループ配下: グループは public、`revocations` だけ protected で上書き
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::system::{RevocationStatsResponse, VersionResponse},
        extractors::AuthCtxExtractor,
    },
    state::AppState,
};

pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn revocations(
    State(state): State<AppState>,
    AuthCtxExtractor(_ctx): AuthCtxExtractor,
) -> Json<RevocationStatsResponse> {
    let store = state.gate.revocations();

    Json(RevocationStatsResponse {
        backend: store.backend_name(),
        entries: store.len(),
    })
}
