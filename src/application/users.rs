use crate::domain::ports::{SharedObjectStore, SharedUserCache, SharedUserStore};
use crate::domain::user::{User, UserPatch};
use crate::error::{Result, ServiceError};
use tracing::info;

/// Record maintenance: partial updates, profile pictures, listing.
///
/// Every write path invalidates the user's cache entry before returning, so a
/// later lookup repopulates from the store.
pub struct UserService {
    store: SharedUserStore,
    cache: SharedUserCache,
    objects: SharedObjectStore,
}

impl UserService {
    pub fn new(
        store: SharedUserStore,
        cache: SharedUserCache,
        objects: SharedObjectStore,
    ) -> Self {
        Self {
            store,
            cache,
            objects,
        }
    }

    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User> {
        patch.validate()?;
        self.ensure_exists(id).await?;
        let user = self.store.update_partial(id, patch).await?;
        self.cache.invalidate(id).await?;
        Ok(user)
    }

    pub async fn update_profile_picture(
        &self,
        id: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<User> {
        if bytes.is_empty() {
            return Err(ServiceError::Validation(
                "profile picture is empty".to_string(),
            ));
        }
        self.ensure_exists(id).await?;

        let key = format!("profile-pictures/{id}");
        let url = self.objects.upload(&key, bytes, mime_type).await?;
        info!(user_id = id, url = %url, "profile picture uploaded");

        let user = self.store.update_profile_picture(id, &url).await?;
        self.cache.invalidate(id).await?;
        Ok(user)
    }

    pub async fn list_users(&self, limit: usize) -> Result<Vec<User>> {
        self.store.list(limit).await
    }

    async fn ensure_exists(&self, id: &str) -> Result<()> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
