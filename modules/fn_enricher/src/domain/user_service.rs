use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::contract::error::UserServiceError;
use crate::contract::model::{NewUser, User, UserPatch, UserQuery};
use crate::domain::ports::UserCache;
use crate::domain::repo::UsersRepository;

/// Read/write path over stored users with cache-aside reads.
///
/// Only `create_user` treats a cache failure as an error; every other cache
/// interaction is best effort.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UsersRepository>,
    cache: Arc<dyn UserCache>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UsersRepository>, cache: Arc<dyn UserCache>) -> Self {
        Self { repo, cache }
    }

    #[instrument(name = "fn_enricher.users.create_user", skip(self), fields(name = %new_user.name))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, UserServiceError> {
        let user = self
            .repo
            .create_user(new_user)
            .await
            .map_err(|e| UserServiceError::storage(e.to_string()))?;

        self.cache
            .set(&user)
            .await
            .map_err(|e| UserServiceError::cache(e.to_string()))?;

        info!(user_id = user.id, "Successfully created user");
        Ok(user)
    }

    #[instrument(name = "fn_enricher.users.get_user", skip(self))]
    pub async fn get_user(&self, id: i32) -> Result<User, UserServiceError> {
        match self.cache.get(id).await {
            Ok(Some(user)) => {
                debug!("Cache hit");
                return Ok(user);
            }
            Ok(None) => debug!("Cache miss"),
            Err(e) => debug!("Cache get failed (falling back to storage): {e}"),
        }

        let user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| UserServiceError::storage(e.to_string()))?
            .ok_or_else(|| UserServiceError::not_found(id))?;

        if let Err(e) = self.cache.set(&user).await {
            warn!("err writing user to cache: {e}");
        }
        Ok(user)
    }

    #[instrument(name = "fn_enricher.users.list_users", skip(self))]
    pub async fn list_users(&self, query: UserQuery) -> Result<Vec<User>, UserServiceError> {
        let users = self
            .repo
            .list_users(&query)
            .await
            .map_err(|e| UserServiceError::storage(e.to_string()))?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    #[instrument(name = "fn_enricher.users.update_user", skip(self))]
    pub async fn update_user(&self, id: i32, patch: UserPatch) -> Result<User, UserServiceError> {
        let user = self
            .repo
            .update_user(id, patch)
            .await
            .map_err(|e| UserServiceError::storage(e.to_string()))?
            .ok_or_else(|| UserServiceError::not_found(id))?;

        if let Err(e) = self.cache.update(&user).await {
            warn!("err updating user in cache: {e}");
        }

        info!("Successfully updated user");
        Ok(user)
    }

    #[instrument(name = "fn_enricher.users.delete_user", skip(self))]
    pub async fn delete_user(&self, id: i32) -> Result<(), UserServiceError> {
        let deleted = self
            .repo
            .delete_user(id)
            .await
            .map_err(|e| UserServiceError::storage(e.to_string()))?;

        if !deleted {
            return Err(UserServiceError::not_found(id));
        }

        if let Err(e) = self.cache.delete(id).await {
            warn!("err deleting user from cache: {e}");
        }

        info!("Successfully deleted user");
        Ok(())
    }
}
