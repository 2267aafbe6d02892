use async_trait::async_trait;
use serde::Serialize;

use crate::services::auth::verifier::SubjectId;

/// Identity resolved from a verified subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("principal backend error: {0}")]
    Backend(String),
}

/// Resolves a subject into a principal. Called only after the token verified.
///
/// - `Ok(Some(_))`: resolved
/// - `Ok(None)`: the subject no longer exists
/// - `Err(_)`: the backend could not answer
#[async_trait]
pub trait PrincipalLookup: Send + Sync {
    async fn find_principal(&self, subject: &SubjectId) -> Result<Option<Principal>, LookupError>;
}
