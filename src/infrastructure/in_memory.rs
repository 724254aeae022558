use crate::domain::ports::{UserCache, UserStore};
use crate::domain::user::{
    Amount, BalanceDirection, BankingDetails, User, UserPatch, UserSnapshot,
};
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

/// A thread-safe in-memory user store.
///
/// Uses `Arc<RwLock<HashMap<String, User>>>` to allow shared concurrent
/// access. `update_balance` performs its read-modify-write under the map's
/// write lock, so concurrent deltas for the same user cannot lose updates.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    /// Creates a new, empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user directly, for seeding demo data and tests.
    pub async fn seed(&self, user: User) {
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: User) -> Result<User> {
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn list(&self, limit: usize) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all.truncate(limit);
        Ok(all)
    }

    async fn update_partial(&self, id: &str, patch: UserPatch) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(address) = patch.address {
            user.address = Some(address);
        }
        if let Some(url) = patch.profile_picture_url {
            user.profile_picture_url = Some(url);
        }
        if let Some(details_patch) = patch.banking_details {
            let details = user.banking_details.get_or_insert_with(|| BankingDetails {
                agency: String::new(),
                account_number: String::new(),
                balance: Decimal::ZERO,
            });
            if let Some(agency) = details_patch.agency {
                details.agency = agency;
            }
            if let Some(account_number) = details_patch.account_number {
                details.account_number = account_number;
            }
        }

        Ok(user.clone())
    }

    async fn update_profile_picture(&self, id: &str, url: &str) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        user.profile_picture_url = Some(url.to_string());
        Ok(user.clone())
    }

    async fn update_balance(
        &self,
        id: &str,
        amount: Amount,
        direction: BalanceDirection,
    ) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        let details = user
            .banking_details
            .as_mut()
            .ok_or_else(|| ServiceError::NoBankingDetails(id.to_string()))?;

        // The store does not enforce non-negativity; a debit may overdraw.
        match direction {
            BalanceDirection::Credit => details.balance += amount.value(),
            BalanceDirection::Debit => details.balance -= amount.value(),
        }
        Ok(())
    }
}

/// An in-memory user cache with per-entry expiry.
///
/// Entries hold the serialized canonical snapshot, the same bytes a Redis
/// deployment would store, so normalization behaves identically in tests and
/// local wiring.
#[derive(Default, Clone)]
pub struct InMemoryUserCache {
    entries: Arc<RwLock<HashMap<String, (String, Instant)>>>,
}

impl InMemoryUserCache {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw JSON entry, bypassing snapshot serialization.
    pub async fn put_raw(&self, id: &str, json: &str, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(id.to_string(), (json.to_string(), Instant::now() + ttl));
    }

    /// Returns the stored JSON for a key, if present and unexpired.
    pub async fn raw(&self, id: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(id)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(json, _)| json.clone())
    }
}

#[async_trait]
impl UserCache for InMemoryUserCache {
    async fn get(&self, id: &str) -> Result<Option<UserSnapshot>> {
        let mut entries = self.entries.write().await;
        let Some((json, expires_at)) = entries.get(id).cloned() else {
            return Ok(None);
        };
        if expires_at <= Instant::now() {
            entries.remove(id);
            return Ok(None);
        }
        match serde_json::from_str(&json) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                // A corrupt entry must not wedge lookups; treat it as a miss.
                warn!(user_id = id, error = %err, "dropping undecodable cache entry");
                entries.remove(id);
                Ok(None)
            }
        }
    }

    async fn put(&self, id: &str, snapshot: &UserSnapshot, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(snapshot)
            .map_err(|err| ServiceError::Backend(Box::new(err)))?;
        let mut entries = self.entries.write().await;
        entries.insert(id.to_string(), (json, Instant::now() + ttl));
        Ok(())
    }

    async fn invalidate(&self, id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(id);
        Ok(())
    }
}
