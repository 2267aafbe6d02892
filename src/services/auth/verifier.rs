use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Subject identifier carried in `sub`.
///
/// Issuers put either a numeric user id or a string in `sub`; both are kept
/// in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claims of a token that passed signature and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub subject: SubjectId,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
    #[error("'{0}' claim out of range")]
    ClaimOutOfRange(&'static str),
    // Only produced by verifiers that call out to another service.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

impl VerifyError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError>;

    /// How long past `exp` a token is still accepted.
    fn leeway(&self) -> chrono::Duration {
        chrono::Duration::zero()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawSubject {
    Text(String),
    Number(i64),
}

impl From<RawSubject> for String {
    fn from(raw: RawSubject) -> Self {
        match raw {
            RawSubject::Text(s) => s,
            RawSubject::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AccessTokenClaims {
    sub: RawSubject,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

/// HS256 verifier keyed with the secret shared with the token issuer.
///
/// Key material is not printable via Debug.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(secret: &str, leeway_seconds: u64) -> Self {
        // `exp` is required by default; `sub` presence is enforced by the claims type.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Signature + `exp` check, then conversion into `VerifiedClaims`.
    pub fn verify_sync(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let subject = String::from(claims.sub);
        if subject.trim().is_empty() {
            return Err(VerifyError::EmptyClaim("sub"));
        }

        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(VerifyError::ClaimOutOfRange("exp"))?;
        let issued_at = claims
            .iat
            .map(|iat| DateTime::from_timestamp(iat, 0).ok_or(VerifyError::ClaimOutOfRange("iat")))
            .transpose()?;

        Ok(VerifiedClaims {
            subject: SubjectId::new(subject),
            issued_at,
            expires_at,
        })
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        self.verify_sync(token)
    }

    fn leeway(&self) -> chrono::Duration {
        i64::try_from(self.validation.leeway)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Deserialize)]
struct ExpiryOnly {
    exp: i64,
}

/// Read `exp` from a JWT payload WITHOUT checking the signature.
///
/// Only for sizing revocation entries: an attacker-chosen `exp` can at worst
/// shorten how long their own token stays on the revocation list, and past
/// that point the verifier rejects it anyway.
pub fn unverified_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: ExpiryOnly = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}
