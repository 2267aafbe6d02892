/// Factory: build the `AccessGate` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, RevocationBackend};
use crate::services::auth::{
    AccessGate, GatePolicy, JwtVerifier, PrincipalLookup, RouteMarkers,
    revocation::{MemoryRevocationStore, RevocationError, RevocationStore, ValkeyRevocationStore},
};

pub async fn build_revocation_store(
    config: &Config,
) -> Result<Arc<dyn RevocationStore>, RevocationError> {
    let store: Arc<dyn RevocationStore> = match &config.revocation_backend {
        RevocationBackend::Memory => Arc::new(MemoryRevocationStore::new(config.revocation_grace)),
        RevocationBackend::Valkey { url } => {
            Arc::new(ValkeyRevocationStore::connect(url, config.revocation_grace).await?)
        }
    };

    Ok(store)
}

pub async fn build_access_gate(
    config: &Config,
    markers: RouteMarkers,
    principals: Arc<dyn PrincipalLookup>,
) -> Result<Arc<AccessGate>, RevocationError> {
    let revocations = build_revocation_store(config).await?;
    let verifier = Arc::new(JwtVerifier::new(
        &config.jwt_secret,
        config.access_token_leeway_seconds,
    ));

    let policy = GatePolicy {
        upstream_timeout: config.upstream_timeout,
        revocation_fallback_ttl: config.revocation_fallback_ttl,
    };

    Ok(Arc::new(AccessGate::new(
        markers,
        revocations,
        verifier,
        principals,
        policy,
    )))
}
