/*
 * Responsibility
 * - v1 の URL 構造
 * - どのルートが認証をスキップするかの route marker 定義。
 *   ルートと marker が一緒に変わるようにここで宣言する
 */
use axum::{
    Router,
    http::Method,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    health::health,
    me::me,
    sessions::logout,
    system::{revocations, version},
};
use crate::services::auth::{Access, RouteMarkers};
use crate::state::AppState;

pub const PREFIX: &str = "/api/v1";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
        .route("/sessions/logout", post(logout))
        .route("/system/version", get(version))
        .route("/system/revocations", get(revocations))
}

/// Markers are matched against full templates (with `PREFIX`).
/// Anything not listed requires authentication.
pub fn markers() -> RouteMarkers {
    RouteMarkers::builder()
        .route(Method::GET, &format!("{PREFIX}/health"), Access::Public)
        .group(&format!("{PREFIX}/system"), Access::Public)
        .route(
            Method::GET,
            &format!("{PREFIX}/system/revocations"),
            Access::Protected,
        )
        .build()
}
