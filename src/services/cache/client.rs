//! Key/TTL cache interface used by the distributed revocation backend.
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command).
///
/// Kept independent from `AppError`; the revocation store decides how a
/// backend failure is surfaced (it fails closed).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// String keys with expiry. Implementations must be cheap to clone.
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // Backend name for logging.
    fn backend_name(&self) -> &'static str;

    // Set value if the key does not exist, with TTL.
    //
    // Returns:
    // - `Ok(true)`  if the key was set
    // - `Ok(false)` if the key already exists
    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<bool>;

    // Extend the TTL of an existing key. `Ok(false)` if the key is gone.
    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool>;

    async fn exists(&self, key: &str) -> CacheResult<bool>;
}
