use async_trait::async_trait;

use crate::contract::{
    error::UsersInfoError,
    model::{NewUser, User},
};

/// Public API trait for the users_info module that other modules can use
#[async_trait]
pub trait UsersInfoApi: Send + Sync {
    /// All users in insertion order
    async fn list_users(&self) -> Result<Vec<User>, UsersInfoError>;

    /// First user with the given id; `Ok(None)` when there is none
    async fn get_user(&self, id: i64) -> Result<Option<User>, UsersInfoError>;

    /// Create a new user with a server-assigned id
    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersInfoError>;
}
