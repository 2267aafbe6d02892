//! マッチした全ルートでアクセスゲートを走らせ、解決した principal を
//! request extensions (`AuthCtx`) 経由で handler に渡す。
//!
//! ルートの識別子はマッチしたパステンプレート (`/api/v1/notes/{id}`) なので、
//! marker は具体的なパスではなくテンプレートに対して宣言する。

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{GateOutcome, RouteKey};
use crate::state::AppState;

/// `router` に登録された全ルートの手前に gate を掛ける。
///
/// `layer` ではなく `route_layer`: マッチしたパスが分かり、
/// マッチしないリクエストはそのまま 404 になる。
///
/// ```ignore
/// let router = Router::new().nest("/api/v1", api::v1::routes());
/// let router = middleware::auth::access::apply(router, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

fn route_key(req: &Request<Body>) -> RouteKey {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    RouteKey::new(req.method().clone(), path)
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let route = route_key(&req);
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    match state.gate.authorize(&route, authorization.as_deref()).await? {
        GateOutcome::Public => {}
        GateOutcome::Authenticated { claims, principal } => {
            // middleware -> extractor
            req.extensions_mut().insert(AuthCtx::new(principal, claims));
        }
    }

    Ok(next.run(req).await)
}
