use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::services::auth::revocation::store::{
    RevocationEntry, RevocationError, RevocationStore, TokenFingerprint,
};

/// In-process revocation store on a sharded concurrent map.
///
/// Revocations and checks on unrelated tokens land on different shards and do
/// not serialize each other. Shard guards never outlive a single call.
#[derive(Debug)]
pub struct MemoryRevocationStore {
    entries: DashMap<TokenFingerprint, RevocationEntry>,
    grace: Duration,
}

impl MemoryRevocationStore {
    pub fn new(grace: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            grace,
        }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn get(&self, token: &str) -> Option<RevocationEntry> {
        self.entries
            .get(&TokenFingerprint::of(token))
            .map(|e| e.value().clone())
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn revoke(&self, entry: RevocationEntry) -> Result<bool, RevocationError> {
        match self.entries.entry(entry.fingerprint.clone()) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().absorb(&entry);
                Ok(false)
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(true)
            }
        }
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        Ok(self.entries.contains_key(&TokenFingerprint::of(token)))
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<usize, RevocationError> {
        let grace = self.grace;
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.evictable_at(grace) > now;
            if !keep {
                evicted += 1;
            }
            keep
        });
        Ok(evicted)
    }

    fn len(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn entry(token: &str, now: DateTime<Utc>, ttl_secs: i64) -> RevocationEntry {
        RevocationEntry::new(token, now, now + Duration::seconds(ttl_secs))
    }

    #[tokio::test]
    async fn revoked_token_is_reported() {
        let store = MemoryRevocationStore::new(Duration::seconds(60));
        let now = Utc::now();

        assert!(!store.is_revoked("a").await.unwrap());
        assert!(store.revoke(entry("a", now, 600)).await.unwrap());
        assert!(store.is_revoked("a").await.unwrap());
        assert!(!store.is_revoked("b").await.unwrap());
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let store = MemoryRevocationStore::new(Duration::seconds(60));
        let now = Utc::now();

        assert!(store.revoke(entry("a", now, 600)).await.unwrap());
        assert!(!store.revoke(entry("a", now + Duration::seconds(5), 600)).await.unwrap());

        assert!(store.is_revoked("a").await.unwrap());
        assert_eq!(store.len(), Some(1));
        assert_eq!(store.get("a").unwrap().revoked_at, now);
    }

    #[tokio::test]
    async fn naturally_expired_entry_stays_revoked_until_evicted() {
        let store = MemoryRevocationStore::new(Duration::seconds(60));
        let now = Utc::now();
        store.revoke(entry("old", now - Duration::hours(1), -10)).await.unwrap();

        assert!(store.is_revoked("old").await.unwrap());

        store.evict_expired(now).await.unwrap();
        assert!(!store.is_revoked("old").await.unwrap());
    }

    #[tokio::test]
    async fn eviction_respects_grace_window() {
        let store = MemoryRevocationStore::new(Duration::seconds(60));
        let now = Utc::now();
        store.revoke(entry("t", now, 10)).await.unwrap();

        // expired, but inside the grace window
        assert_eq!(store.evict_expired(now + Duration::seconds(30)).await.unwrap(), 0);
        assert!(store.is_revoked("t").await.unwrap());

        assert_eq!(store.evict_expired(now + Duration::seconds(70)).await.unwrap(), 1);
        assert!(!store.is_revoked("t").await.unwrap());
    }

    #[tokio::test]
    async fn memory_stays_bounded_under_churn() {
        let store = MemoryRevocationStore::new(Duration::zero());
        let start = Utc::now();

        // Each "second" revokes 100 tokens that live 5 seconds, then sweeps.
        for tick in 0..50i64 {
            let now = start + Duration::seconds(tick);
            for i in 0..100 {
                store
                    .revoke(entry(&format!("tok-{tick}-{i}"), now, 5))
                    .await
                    .unwrap();
            }
            store.evict_expired(now).await.unwrap();
            assert!(store.len().unwrap() <= 600);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_revokes_are_never_lost() {
        let store = Arc::new(MemoryRevocationStore::new(Duration::seconds(60)));
        let now = Utc::now();

        let mut writers = Vec::new();
        for w in 0..8 {
            let store = store.clone();
            writers.push(tokio::spawn(async move {
                for i in 0..250 {
                    let token = format!("w{w}-t{i}");
                    store.revoke(entry(&token, now, 600)).await.unwrap();
                    // Once revoke has returned, the token must be visible.
                    assert!(store.is_revoked(&token).await.unwrap());
                }
            }));
        }

        let mut readers = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            readers.push(tokio::spawn(async move {
                for i in 0..250 {
                    let _ = store.is_revoked(&format!("w0-t{i}")).await.unwrap();
                }
            }));
        }

        for h in writers.into_iter().chain(readers) {
            h.await.unwrap();
        }

        assert_eq!(store.len(), Some(8 * 250));
        for w in 0..8 {
            for i in 0..250 {
                assert!(store.is_revoked(&format!("w{w}-t{i}")).await.unwrap());
            }
        }
    }

    #[tokio::test]
    async fn far_future_expiry_does_not_break_eviction() {
        let store = MemoryRevocationStore::new(Duration::seconds(60));
        let now = Utc::now();
        store
            .revoke(RevocationEntry::new("forever", now, DateTime::<Utc>::MAX_UTC))
            .await
            .unwrap();
        store.revoke(entry("stale", now - Duration::hours(1), -120)).await.unwrap();

        assert_eq!(store.evict_expired(now).await.unwrap(), 1);
        assert!(store.is_revoked("forever").await.unwrap());
        assert!(!store.is_revoked("stale").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn eviction_count_ignores_concurrent_revokes() {
        let store = Arc::new(MemoryRevocationStore::new(Duration::zero()));
        let now = Utc::now();
        for i in 0..500 {
            store.revoke(entry(&format!("old-{i}"), now, -10)).await.unwrap();
        }

        let mut writers = Vec::new();
        for w in 0..4 {
            let store = store.clone();
            writers.push(tokio::spawn(async move {
                for i in 0..250 {
                    store.revoke(entry(&format!("new-{w}-{i}"), now, 600)).await.unwrap();
                }
            }));
        }
        let evicted = store.evict_expired(now).await.unwrap();
        for h in writers {
            h.await.unwrap();
        }

        assert_eq!(evicted, 500);
        assert_eq!(store.len(), Some(1000));
    }
}

