/*
 * Responsibility
 * - handler から見た認証済みコンテキスト
 * - gate middleware が組み立てて request extensions に入れる。
 *   handler が受け取るのはこの型だけ
 */
use chrono::{DateTime, Utc};

use crate::services::auth::{Principal, SubjectId, VerifiedClaims};

/// Context attached to an authenticated request. Lives as long as the request.
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub principal: Principal,
    pub subject: SubjectId,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl AuthCtx {
    pub fn new(principal: Principal, claims: VerifiedClaims) -> Self {
        Self {
            principal,
            subject: claims.subject,
            issued_at: claims.issued_at,
            expires_at: claims.expires_at,
        }
    }
}
