use std::sync::Arc;

use crate::contract::model::{NewUser, User};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;
use tracing::{debug, info, instrument};

/// Domain service for the user directory.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
}

impl Service {
    pub fn new(repo: Arc<dyn UsersRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "users_info.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        let users = self
            .repo
            .list()
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    /// Lookup that reports absence as `None`.
    #[instrument(name = "users_info.service.find_user", skip(self), fields(user_id = %id))]
    pub async fn find_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        let user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        if user.is_none() {
            debug!("No user with this id");
        }
        Ok(user)
    }

    /// Lookup that reports absence as `DomainError::UserNotFound`.
    #[instrument(name = "users_info.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: i64) -> Result<User, DomainError> {
        self.find_user(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(
        name = "users_info.service.create_user",
        skip(self),
        fields(name = %new_user.name, email = %new_user.email)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        let user = self
            .repo
            .append(new_user)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;

        info!("Created user with id={}", user.id);
        Ok(user)
    }
}
