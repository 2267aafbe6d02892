/*
 * Responsibility
 * - middleware の公開窓口
 *   - auth::access: 全ルートの手前で動くアクセスゲート
 *   - http: request id / tracing / 各種制限 (全リクエスト共通)
 */
pub mod auth;
pub mod http;
