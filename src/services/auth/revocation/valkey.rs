use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::services::{
    auth::revocation::store::{RevocationEntry, RevocationError, RevocationStore, TokenFingerprint},
    cache::{CacheClient, ValkeyClient},
};

const MIN_TTL: std::time::Duration = std::time::Duration::from_secs(1);

/// Valkey-backed revocation store, shared by every process behind the same
/// backend.
///
/// Each entry is a key whose TTL is the token's remaining lifetime plus the
/// grace window, so eviction happens in the backend and `evict_expired` has
/// nothing to do. Backend errors are returned as-is; the gate fails closed.
#[derive(Clone)]
pub struct ValkeyRevocationStore<C: CacheClient> {
    cache: Arc<C>,
    prefix: String,
    grace: Duration,
}

impl<C: CacheClient> std::fmt::Debug for ValkeyRevocationStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValkeyRevocationStore")
            .field("backend", &self.cache.backend_name())
            .field("prefix", &self.prefix)
            .field("grace", &self.grace)
            .finish()
    }
}

impl ValkeyRevocationStore<ValkeyClient> {
    pub async fn connect(url: &str, grace: Duration) -> Result<Self, RevocationError> {
        let client = ValkeyClient::new(url).await?;
        Ok(Self::new_with_cache(Arc::new(client), "auth:revoked", grace))
    }
}

impl<C: CacheClient> ValkeyRevocationStore<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>, grace: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            grace,
        }
    }

    pub fn key(&self, fingerprint: &TokenFingerprint) -> String {
        format!("{}:{}", self.prefix, fingerprint)
    }

    // Valkey rejects `EX 0`; an already-expired entry still lives one second.
    fn ttl(&self, entry: &RevocationEntry, now: DateTime<Utc>) -> std::time::Duration {
        (entry.evictable_at(self.grace) - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
            .max(MIN_TTL)
    }
}

#[async_trait]
impl<C: CacheClient> RevocationStore for ValkeyRevocationStore<C> {
    fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    async fn revoke(&self, entry: RevocationEntry) -> Result<bool, RevocationError> {
        let key = self.key(&entry.fingerprint);
        let ttl = self.ttl(&entry, Utc::now());
        let value = entry.revoked_at.timestamp().to_string();

        let inserted = self.cache.set_if_absent_with_ttl(&key, &value, ttl).await?;
        if !inserted {
            // Already revoked: keep the original value, only push the expiry out.
            self.cache.expire(&key, ttl).await?;
        }

        Ok(inserted)
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let key = self.key(&TokenFingerprint::of(token));
        Ok(self.cache.exists(&key).await?)
    }

    async fn evict_expired(&self, _now: DateTime<Utc>) -> Result<usize, RevocationError> {
        Ok(0)
    }

    fn len(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::services::cache::CacheResult;

    #[derive(Clone, Default)]
    struct FakeCache {
        keys: Arc<Mutex<HashMap<String, (String, std::time::Duration)>>>,
    }

    #[async_trait]
    impl CacheClient for FakeCache {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn set_if_absent_with_ttl(
            &self,
            key: &str,
            value: &str,
            ttl: std::time::Duration,
        ) -> CacheResult<bool> {
            let mut keys = self.keys.lock().unwrap();
            if keys.contains_key(key) {
                return Ok(false);
            }
            keys.insert(key.to_string(), (value.to_string(), ttl));
            Ok(true)
        }

        async fn expire(&self, key: &str, ttl: std::time::Duration) -> CacheResult<bool> {
            let mut keys = self.keys.lock().unwrap();
            match keys.get_mut(key) {
                Some(slot) => {
                    slot.1 = slot.1.max(ttl);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn exists(&self, key: &str) -> CacheResult<bool> {
            Ok(self.keys.lock().unwrap().contains_key(key))
        }
    }

    #[tokio::test]
    async fn stores_fingerprint_with_ttl_covering_expiry_and_grace() {
        let cache = Arc::new(FakeCache::default());
        let store = ValkeyRevocationStore::new_with_cache(cache.clone(), "t", Duration::seconds(60));
        let now = Utc::now();

        let entry = RevocationEntry::new("raw-token", now, now + Duration::seconds(600));
        let key = store.key(&entry.fingerprint);
        assert!(store.revoke(entry).await.unwrap());

        let keys = cache.keys.lock().unwrap();
        let (value, ttl) = keys.get(&key).unwrap();
        assert_eq!(value, &now.timestamp().to_string());
        assert!(ttl.as_secs() > 600 && ttl.as_secs() <= 660);
        assert!(!key.contains("raw-token"));
    }

    #[tokio::test]
    async fn second_revoke_keeps_original_timestamp() {
        let cache = Arc::new(FakeCache::default());
        let store = ValkeyRevocationStore::new_with_cache(cache.clone(), "t", Duration::zero());
        let now = Utc::now();

        assert!(store
            .revoke(RevocationEntry::new("tok", now, now + Duration::seconds(100)))
            .await
            .unwrap());
        assert!(!store
            .revoke(RevocationEntry::new("tok", now + Duration::seconds(5), now + Duration::seconds(900)))
            .await
            .unwrap());

        assert!(store.is_revoked("tok").await.unwrap());
        let keys = cache.keys.lock().unwrap();
        let (value, ttl) = keys.values().next().unwrap();
        assert_eq!(value, &now.timestamp().to_string());
        assert!(ttl.as_secs() > 800);
    }

    #[tokio::test]
    async fn already_expired_token_still_gets_a_positive_ttl() {
        let cache = Arc::new(FakeCache::default());
        let store = ValkeyRevocationStore::new_with_cache(cache.clone(), "t", Duration::zero());
        let now = Utc::now();

        store
            .revoke(RevocationEntry::new("late", now, now - Duration::hours(1)))
            .await
            .unwrap();

        let keys = cache.keys.lock().unwrap();
        let (_, ttl) = keys.values().next().unwrap();
        assert_eq!(*ttl, MIN_TTL);
    }

    #[tokio::test]
    async fn far_future_expiry_is_stored_without_overflow() {
        let cache = Arc::new(FakeCache::default());
        let store = ValkeyRevocationStore::new_with_cache(cache.clone(), "t", Duration::seconds(60));

        assert!(store
            .revoke(RevocationEntry::new("forever", Utc::now(), DateTime::<Utc>::MAX_UTC))
            .await
            .unwrap());

        let keys = cache.keys.lock().unwrap();
        let (_, ttl) = keys.values().next().unwrap();
        assert!(ttl.as_secs() > 8_000_000_000_000);
    }
}

