/*
 * Responsibility
 * - token の subject から `users` テーブルの principal を引く
 * - DB エラーは LookupError として返す (gate 側で upstream 障害扱い)
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;
use crate::services::auth::{LookupError, Principal, PrincipalLookup, SubjectId};

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<UserRow> for Principal {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.name,
        }
    }
}

// Subjects arrive as text; the id column may be integer or uuid, so compare as text.
pub async fn find_by_id(db: &PgPool, id: &str) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id::text AS id, email, name
        FROM users
        WHERE id::text = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

#[derive(Clone, Debug)]
pub struct PgPrincipalLookup {
    db: PgPool,
}

impl PgPrincipalLookup {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PrincipalLookup for PgPrincipalLookup {
    async fn find_principal(&self, subject: &SubjectId) -> Result<Option<Principal>, LookupError> {
        find_by_id(&self.db, subject.as_str())
            .await
            .map(|row| row.map(Principal::from))
            .map_err(|e| LookupError::Backend(e.to_string()))
    }
}
