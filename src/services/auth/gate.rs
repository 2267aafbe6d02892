//! Access gate: per-request authentication decision.
//!
//! CHECK_PUBLIC -> EXTRACT_TOKEN -> CHECK_REVOKED -> VERIFY -> ATTACH_PRINCIPAL
//!
//! Each step either ends the evaluation (allow public / reject) or hands over
//! to the next. Revocation is consulted before the signature is checked, so a
//! revoked token is rejected even while it is still cryptographically valid.
//!
//! The gate holds no locks of its own. Store checks, verification and principal
//! lookup are each bounded by `GatePolicy::upstream_timeout`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::services::auth::{
    bearer,
    principal::{Principal, PrincipalLookup},
    revocation::{
        RevocationEntry, RevocationError, RevocationStore, TokenFingerprint, saturating_add,
    },
    route_marker::{RouteKey, RouteMarkers},
    verifier::{TokenVerifier, VerifiedClaims, unverified_expiry},
};

#[derive(Debug, Clone, Copy)]
pub struct GatePolicy {
    // Upper bound for each call that may leave the process.
    pub upstream_timeout: Duration,
    // Revocation lifetime for tokens whose `exp` cannot be read.
    pub revocation_fallback_ttl: chrono::Duration,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            upstream_timeout: Duration::from_secs(2),
            revocation_fallback_ttl: chrono::Duration::hours(24),
        }
    }
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("no credential supplied")]
    NoCredential,
    #[error("session invalidated, re-authentication required")]
    RevokedCredential,
    #[error("credential invalid or expired")]
    InvalidCredential,
    #[error("authentication upstream unavailable, retry later")]
    UpstreamUnavailable,
}

impl AccessDenied {
    pub fn reason_code(self) -> &'static str {
        match self {
            Self::NoCredential => "no_credential",
            Self::RevokedCredential => "revoked_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::UpstreamUnavailable => "upstream_unavailable",
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, Self::UpstreamUnavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Route is public; nothing was checked and no principal is attached.
    Public,
    Authenticated {
        claims: VerifiedClaims,
        principal: Principal,
    },
}

pub struct AccessGate {
    markers: RouteMarkers,
    revocations: Arc<dyn RevocationStore>,
    verifier: Arc<dyn TokenVerifier>,
    principals: Arc<dyn PrincipalLookup>,
    policy: GatePolicy,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("markers", &self.markers)
            .field("revocations", &self.revocations.backend_name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    pub fn new(
        markers: RouteMarkers,
        revocations: Arc<dyn RevocationStore>,
        verifier: Arc<dyn TokenVerifier>,
        principals: Arc<dyn PrincipalLookup>,
        policy: GatePolicy,
    ) -> Self {
        Self {
            markers,
            revocations,
            verifier,
            principals,
            policy,
        }
    }

    pub fn markers(&self) -> &RouteMarkers {
        &self.markers
    }

    pub fn revocations(&self) -> &Arc<dyn RevocationStore> {
        &self.revocations
    }

    /// Run the gate for one request.
    ///
    /// `authorization` is the raw `Authorization` header value, if any.
    pub async fn authorize(
        &self,
        route: &RouteKey,
        authorization: Option<&str>,
    ) -> Result<GateOutcome, AccessDenied> {
        // CHECK_PUBLIC
        if self.markers.is_public(route) {
            debug!(%route, "public route, skipping authentication");
            return Ok(GateOutcome::Public);
        }

        // EXTRACT_TOKEN
        let Some(token) = bearer::extract(authorization) else {
            warn!(%route, reason = "no_credential", "access denied");
            return Err(AccessDenied::NoCredential);
        };
        let fingerprint = TokenFingerprint::of(token);

        // CHECK_REVOKED
        let revoked = self
            .bounded("revocation check", self.revocations.is_revoked(token))
            .await?
            .map_err(|err| {
                warn!(%route, %fingerprint, error = %err, "revocation store failure");
                AccessDenied::UpstreamUnavailable
            })?;
        if revoked {
            warn!(%route, %fingerprint, reason = "revoked_credential", "access denied");
            return Err(AccessDenied::RevokedCredential);
        }

        // VERIFY
        let claims = match self.bounded("verification", self.verifier.verify(token)).await? {
            Ok(claims) => claims,
            Err(err) if err.is_unavailable() => {
                warn!(%route, %fingerprint, error = %err, "verifier unavailable");
                return Err(AccessDenied::UpstreamUnavailable);
            }
            Err(err) => {
                warn!(%route, %fingerprint, error = %err, reason = "invalid_credential", "access denied");
                return Err(AccessDenied::InvalidCredential);
            }
        };

        // ATTACH_PRINCIPAL: wait for the lookup before letting the request through.
        let principal = self
            .bounded("principal lookup", self.principals.find_principal(&claims.subject))
            .await?
            .map_err(|err| {
                warn!(%route, subject = %claims.subject, error = %err, "principal lookup failed");
                AccessDenied::UpstreamUnavailable
            })?
            .ok_or_else(|| {
                warn!(%route, subject = %claims.subject, reason = "invalid_credential", "unknown subject");
                AccessDenied::InvalidCredential
            })?;

        debug!(%route, subject = %claims.subject, "authenticated");
        Ok(GateOutcome::Authenticated { claims, principal })
    }

    /// Revoke `token` now. Entry point for logout / forced session termination.
    ///
    /// Returns `Ok(true)` the first time a token is revoked.
    pub async fn revoke(&self, token: &str) -> Result<bool, RevocationError> {
        self.revoke_at(token, Utc::now()).await
    }

    pub async fn revoke_at(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, RevocationError> {
        // The entry must outlive the last instant the verifier would still
        // accept the token, leeway included.
        let expires_at = match unverified_expiry(token) {
            Some(exp) => saturating_add(exp, self.verifier.leeway()),
            None => saturating_add(revoked_at, self.policy.revocation_fallback_ttl),
        };
        let entry = RevocationEntry::new(token, revoked_at, expires_at);
        let fingerprint = entry.fingerprint.clone();

        let inserted = self.revocations.revoke(entry).await?;
        info!(
            %fingerprint,
            %expires_at,
            first_time = inserted,
            backend = self.revocations.backend_name(),
            "token revoked"
        );

        Ok(inserted)
    }

    async fn bounded<T>(
        &self,
        stage: &'static str,
        fut: impl Future<Output = T>,
    ) -> Result<T, AccessDenied> {
        tokio::time::timeout(self.policy.upstream_timeout, fut)
            .await
            .map_err(|_| {
                warn!(
                    stage,
                    timeout_ms = self.policy.upstream_timeout.as_millis() as u64,
                    "upstream timed out"
                );
                AccessDenied::UpstreamUnavailable
            })
    }
}
