use super::user::{Amount, BalanceDirection, User, UserPatch, UserSnapshot};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Narrow gateway over the durable user store.
///
/// `update_balance` is the storage-atomic read-modify-write primitive for the
/// balance column; callers never reconstruct a balance in application code.
/// It fails with `NotFound` for an unknown user and `NoBankingDetails` when
/// the user has no banking association.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: User) -> Result<User>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list(&self, limit: usize) -> Result<Vec<User>>;
    async fn update_partial(&self, id: &str, patch: UserPatch) -> Result<User>;
    async fn update_profile_picture(&self, id: &str, url: &str) -> Result<User>;
    async fn update_balance(
        &self,
        id: &str,
        amount: Amount,
        direction: BalanceDirection,
    ) -> Result<()>;
}

/// Key-value cache sitting in front of the user store.
///
/// Backend failures surface as `Err`, distinct from an `Ok(None)` miss, so
/// callers can choose between failing open and failing closed. `invalidate`
/// is idempotent: deleting an absent key succeeds.
#[async_trait]
pub trait UserCache: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<UserSnapshot>>;
    async fn put(&self, id: &str, snapshot: &UserSnapshot, ttl: Duration) -> Result<()>;
    async fn invalidate(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthTokens {
    pub access_token: String,
    pub id_token: String,
}

/// External identity provider handling the credential lifecycle.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers the credentials and returns the subject id the provider
    /// assigned; that id becomes the user's primary key.
    async fn sign_up(&self, email: &str, password: &str) -> Result<String>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens>;
    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()>;
    async fn resend_code(&self, email: &str) -> Result<()>;
}

/// Object storage for profile pictures.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads the bytes under `key` and returns the public URL.
    async fn upload(&self, key: &str, bytes: Vec<u8>, mime_type: &str) -> Result<String>;
}

pub type SharedUserStore = Arc<dyn UserStore>;
pub type SharedUserCache = Arc<dyn UserCache>;
pub type SharedIdentityProvider = Arc<dyn IdentityProvider>;
pub type SharedObjectStore = Arc<dyn ObjectStore>;
