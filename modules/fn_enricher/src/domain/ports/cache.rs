use async_trait::async_trait;

use crate::contract::model::User;

/// Key/value cache of persisted users, keyed by the storage identity.
#[async_trait]
pub trait UserCache: Send + Sync {
    /// `Ok(None)` on a cache miss.
    async fn get(&self, id: i32) -> anyhow::Result<Option<User>>;
    async fn set(&self, user: &User) -> anyhow::Result<()>;
    async fn update(&self, user: &User) -> anyhow::Result<()>;
    async fn delete(&self, id: i32) -> anyhow::Result<()>;
}
