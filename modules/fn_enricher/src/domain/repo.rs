use async_trait::async_trait;

use crate::contract::model::{NewUser, User, UserPatch, UserQuery};

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
///
/// Storage owns identity and timestamps. Soft-deleted rows are invisible to
/// every read and update.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert an enriched user and return the stored row.
    async fn create_user(&self, new_user: NewUser) -> anyhow::Result<User>;
    /// Load a live user by id.
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<User>>;
    /// List live users.
    async fn list_users(&self, query: &UserQuery) -> anyhow::Result<Vec<User>>;
    /// Apply a patch. Returns `None` when no live row has this id.
    async fn update_user(&self, id: i32, patch: UserPatch) -> anyhow::Result<Option<User>>;
    /// Soft delete. Returns true if a live row was marked deleted.
    async fn delete_user(&self, id: i32) -> anyhow::Result<bool>;
}
