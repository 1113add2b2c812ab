use crate::contract::model::{NewUser, User};
use async_trait::async_trait;

/// Port for the domain layer: storage operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// All users in insertion order.
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    /// First user whose id equals `id`.
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    /// Assign `current_len + 1` as the id and append, as one atomic step.
    async fn append(&self, new_user: NewUser) -> anyhow::Result<User>;
}
