use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::services::cache::CacheError;

/// SHA-256 of a raw token, base64url without padding.
///
/// The store only ever holds fingerprints, so a dump of the revocation set
/// does not leak usable credentials. Also safe to put in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenFingerprint(String);

impl TokenFingerprint {
    pub fn of(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEntry {
    pub fingerprint: TokenFingerprint,
    pub revoked_at: DateTime<Utc>,
    // Natural expiry of the revoked token.
    pub expires_at: DateTime<Utc>,
}

impl RevocationEntry {
    pub fn new(token: &str, revoked_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint: TokenFingerprint::of(token),
            revoked_at,
            expires_at,
        }
    }

    /// Merge a repeated revocation into this one: first `revoked_at` wins,
    /// the later expiry wins.
    pub fn absorb(&mut self, other: &RevocationEntry) {
        self.revoked_at = self.revoked_at.min(other.revoked_at);
        self.expires_at = self.expires_at.max(other.expires_at);
    }

    /// First instant at which the entry may be dropped.
    pub fn evictable_at(&self, grace: Duration) -> DateTime<Utc> {
        saturating_add(self.expires_at, grace)
    }
}

/// `at + delta`, pinned to the representable range instead of panicking.
pub fn saturating_add(at: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(if delta < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Process-wide set of tokens that must be rejected regardless of their
/// cryptographic validity.
///
/// Every operation is atomic on its own. Membership is independent of expiry:
/// a revoked token whose `exp` has passed still reports `true` until it is
/// evicted.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Idempotent insert. `Ok(true)` if the token was not revoked before.
    async fn revoke(&self, entry: RevocationEntry) -> Result<bool, RevocationError>;

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError>;

    /// Drop entries whose `expires_at + grace` is at or before `now`.
    /// Returns how many were removed.
    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<usize, RevocationError>;

    /// Number of live entries, when the backend can tell cheaply.
    fn len(&self) -> Option<usize>;
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn fingerprint_is_stable_and_does_not_contain_the_token() {
        let a = TokenFingerprint::of("header.payload.signature");
        let b = TokenFingerprint::of("header.payload.signature");
        let c = TokenFingerprint::of("header.payload.other");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 43);
        assert!(!a.as_str().contains("payload"));
    }

    #[test]
    fn absorb_keeps_first_revocation_and_latest_expiry() {
        let t0 = Utc::now();
        let mut first = RevocationEntry::new("tok", t0, t0 + Duration::minutes(5));
        let again = RevocationEntry::new("tok", t0 + Duration::seconds(30), t0 + Duration::minutes(10));

        first.absorb(&again);

        assert_eq!(first.revoked_at, t0);
        assert_eq!(first.expires_at, t0 + Duration::minutes(10));
    }
}
