#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use userhub::application::balance::BalanceService;
use userhub::application::lookup::LookupService;
use userhub::domain::ports::{AuthTokens, IdentityProvider, ObjectStore};
use userhub::domain::user::{BankingDetails, User};
use userhub::error::Result;
use userhub::infrastructure::in_memory::{InMemoryUserCache, InMemoryUserStore};

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        name: format!("user {id}"),
        email: format!("{id}@example.com"),
        address: None,
        profile_picture_url: None,
        banking_details: None,
    }
}

pub fn banked_user(id: &str, balance: Decimal) -> User {
    User {
        banking_details: Some(BankingDetails {
            agency: "0001".to_string(),
            account_number: format!("{id}-acct"),
            balance,
        }),
        ..user(id)
    }
}

pub fn services(
    store: &Arc<InMemoryUserStore>,
    cache: &Arc<InMemoryUserCache>,
) -> (Arc<LookupService>, Arc<BalanceService>) {
    let store = store.clone() as Arc<dyn userhub::domain::ports::UserStore>;
    let cache = cache.clone() as Arc<dyn userhub::domain::ports::UserCache>;
    (
        Arc::new(LookupService::new(store.clone(), cache.clone())),
        Arc::new(BalanceService::new(store, cache)),
    )
}

/// Identity provider double: derives deterministic subjects and tokens.
#[derive(Default)]
pub struct StubIdentityProvider {
    pub sign_ups: AtomicUsize,
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn sign_up(&self, email: &str, _password: &str) -> Result<String> {
        self.sign_ups.fetch_add(1, Ordering::SeqCst);
        Ok(format!("sub-{email}"))
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthTokens> {
        Ok(AuthTokens {
            access_token: format!("access-{email}"),
            id_token: format!("id-{email}"),
        })
    }

    async fn confirm_sign_up(&self, _email: &str, _code: &str) -> Result<()> {
        Ok(())
    }

    async fn resend_code(&self, _email: &str) -> Result<()> {
        Ok(())
    }
}

/// Object store double: records uploads and hands back a deterministic URL.
#[derive(Default)]
pub struct RecordingObjectStore {
    pub uploads: Mutex<Vec<(String, usize, String)>>,
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>, mime_type: &str) -> Result<String> {
        let mut uploads = self.uploads.lock().await;
        uploads.push((key.to_string(), bytes.len(), mime_type.to_string()));
        Ok(format!("https://objects.test/{key}"))
    }
}
