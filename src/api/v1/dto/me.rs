/*
 * Responsibility
 * - GET /me のレスポンス DTO
 */
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::v1::extractors::AuthCtx;
use crate::services::auth::Principal;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: String,
    pub principal: Principal,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl From<AuthCtx> for MeResponse {
    fn from(ctx: AuthCtx) -> Self {
        Self {
            subject: ctx.subject.to_string(),
            principal: ctx.principal,
            issued_at: ctx.issued_at,
            expires_at: ctx.expires_at,
        }
    }
}
