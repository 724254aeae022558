use crate::domain::ports::{SharedUserCache, SharedUserStore};
use crate::domain::user::{User, UserSnapshot};
use crate::error::{Result, ServiceError};
use std::time::Duration;
use tracing::debug;

/// Cache entries expire after five minutes.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Resolves users by id, cache first.
///
/// The cache is always repopulated in the canonical snapshot shape, so a hit
/// and a fresh load are indistinguishable to callers. Cache backend errors
/// propagate instead of falling through to the store (fail-closed); store
/// errors propagate unchanged. Retries are a dispatcher concern, not handled
/// here.
pub struct LookupService {
    store: SharedUserStore,
    cache: SharedUserCache,
    ttl: Duration,
}

impl LookupService {
    pub fn new(store: SharedUserStore, cache: SharedUserCache) -> Self {
        Self::with_ttl(store, cache, CACHE_TTL)
    }

    pub fn with_ttl(store: SharedUserStore, cache: SharedUserCache, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    pub async fn find_user(&self, id: &str) -> Result<User> {
        if let Some(snapshot) = self.cache.get(id).await? {
            debug!(user_id = id, "cache hit");
            return Ok(snapshot.into_user());
        }

        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        self.cache
            .put(id, &UserSnapshot::from(&user), self.ttl)
            .await?;
        debug!(user_id = id, "cache populated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{UserCache, UserStore};
    use crate::domain::user::{Amount, BalanceDirection, BankingDetails, UserPatch};
    use crate::infrastructure::in_memory::{InMemoryUserCache, InMemoryUserStore};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: format!("{id}@example.com"),
            address: None,
            profile_picture_url: None,
            banking_details: Some(BankingDetails {
                agency: "0001".to_string(),
                account_number: "42-7".to_string(),
                balance: dec!(1000.0),
            }),
        }
    }

    /// Counts `find_by_id` calls, delegating everything to the in-memory store.
    struct CountingStore {
        inner: InMemoryUserStore,
        finds: AtomicUsize,
    }

    impl CountingStore {
        fn new(inner: InMemoryUserStore) -> Self {
            Self {
                inner,
                finds: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UserStore for CountingStore {
        async fn create(&self, user: User) -> crate::error::Result<User> {
            self.inner.create(user).await
        }
        async fn find_by_id(&self, id: &str) -> crate::error::Result<Option<User>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_id(id).await
        }
        async fn find_by_email(&self, email: &str) -> crate::error::Result<Option<User>> {
            self.inner.find_by_email(email).await
        }
        async fn list(&self, limit: usize) -> crate::error::Result<Vec<User>> {
            self.inner.list(limit).await
        }
        async fn update_partial(&self, id: &str, patch: UserPatch) -> crate::error::Result<User> {
            self.inner.update_partial(id, patch).await
        }
        async fn update_profile_picture(&self, id: &str, url: &str) -> crate::error::Result<User> {
            self.inner.update_profile_picture(id, url).await
        }
        async fn update_balance(
            &self,
            id: &str,
            amount: Amount,
            direction: BalanceDirection,
        ) -> crate::error::Result<()> {
            self.inner.update_balance(id, amount, direction).await
        }
    }

    /// A cache whose backend is down.
    struct FailingCache;

    #[async_trait]
    impl UserCache for FailingCache {
        async fn get(&self, _id: &str) -> crate::error::Result<Option<UserSnapshot>> {
            Err(ServiceError::Backend("cache connection refused".into()))
        }
        async fn put(
            &self,
            _id: &str,
            _snapshot: &UserSnapshot,
            _ttl: Duration,
        ) -> crate::error::Result<()> {
            Err(ServiceError::Backend("cache connection refused".into()))
        }
        async fn invalidate(&self, _id: &str) -> crate::error::Result<()> {
            Err(ServiceError::Backend("cache connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let inner = InMemoryUserStore::new();
        inner.seed(sample_user("u1")).await;
        let store = Arc::new(CountingStore::new(inner));
        let cache = Arc::new(InMemoryUserCache::new());
        cache
            .put("u1", &UserSnapshot::from(&sample_user("u1")), CACHE_TTL)
            .await
            .unwrap();

        let lookup = LookupService::new(store.clone(), cache);
        let user = lookup.find_user("u1").await.unwrap();

        assert_eq!(user, sample_user("u1"));
        assert_eq!(store.finds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_miss_loads_and_populates() {
        let inner = InMemoryUserStore::new();
        inner.seed(sample_user("u1")).await;
        let store = Arc::new(CountingStore::new(inner));
        let cache = Arc::new(InMemoryUserCache::new());

        let lookup = LookupService::new(store.clone(), cache.clone());
        let user = lookup.find_user("u1").await.unwrap();

        assert_eq!(user, sample_user("u1"));
        assert_eq!(store.finds.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.get("u1").await.unwrap(),
            Some(UserSnapshot::from(&sample_user("u1")))
        );

        // Second call is served from the cache.
        lookup.find_user("u1").await.unwrap();
        assert_eq!(store.finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let store = Arc::new(InMemoryUserStore::new());
        let cache = Arc::new(InMemoryUserCache::new());
        let lookup = LookupService::new(store, cache.clone());

        let result = lookup.find_user("ghost").await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert_eq!(cache.get("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_backend_error_fails_closed() {
        let inner = InMemoryUserStore::new();
        inner.seed(sample_user("u1")).await;
        let store = Arc::new(CountingStore::new(inner));
        let lookup = LookupService::new(store.clone(), Arc::new(FailingCache));

        let result = lookup.find_user("u1").await;
        assert!(matches!(result, Err(ServiceError::Backend(_))));
        assert_eq!(store.finds.load(Ordering::SeqCst), 0);
    }
}
