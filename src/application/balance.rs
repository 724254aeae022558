use crate::domain::ports::{SharedUserCache, SharedUserStore};
use crate::domain::user::{Amount, BalanceDirection};
use crate::error::{Result, ServiceError};
use tracing::warn;

/// Applies signed balance deltas to a single user.
///
/// The store performs the read-modify-write atomically; this service only
/// sequences the mutation with the cache invalidation. The cache entry is
/// invalidated, never rewritten, so the service does not need to know the
/// resulting balance.
pub struct BalanceService {
    store: SharedUserStore,
    cache: SharedUserCache,
}

impl BalanceService {
    pub fn new(store: SharedUserStore, cache: SharedUserCache) -> Self {
        Self { store, cache }
    }

    /// Credits or debits `amount` against the user's balance.
    ///
    /// `NoBankingDetails` and `NotFound` are fatal for the call and must not
    /// be retried blindly: without idempotency tracking a retried debit can
    /// apply twice.
    pub async fn apply_delta(
        &self,
        id: &str,
        amount: Amount,
        direction: BalanceDirection,
    ) -> Result<()> {
        match self.store.update_balance(id, amount, direction).await {
            Ok(()) => {
                self.cache.invalidate(id).await?;
                Ok(())
            }
            Err(err @ (ServiceError::NoBankingDetails(_) | ServiceError::NotFound(_))) => {
                // The store rejected the call before touching the row.
                Err(err)
            }
            Err(err) => {
                // A connectivity failure can surface after the write landed;
                // drop the entry either way.
                if let Err(cache_err) = self.cache.invalidate(id).await {
                    warn!(
                        user_id = id,
                        error = %cache_err,
                        "cache invalidation failed after balance error"
                    );
                }
                Err(err)
            }
        }
    }
}
