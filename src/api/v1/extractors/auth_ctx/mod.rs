/*!
 * 認証コンテキストの extractor
 *
 * Responsibility:
 * - 認証済みリクエストのコンテキスト (AuthCtx) を handler に渡す
 * - axum 依存のコードは core、型は types に置く
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::AuthCtx;
