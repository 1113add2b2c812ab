use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UsersInfoApi,
    error::UsersInfoError,
    model::{NewUser, User},
};
use crate::domain::service::Service;

/// Local implementation of the UsersInfoApi trait that delegates to the domain service
pub struct UsersInfoLocalClient {
    service: Arc<Service>,
}

impl UsersInfoLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UsersInfoApi for UsersInfoLocalClient {
    async fn list_users(&self) -> Result<Vec<User>, UsersInfoError> {
        self.service.list_users().await.map_err(Into::into)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, UsersInfoError> {
        self.service.find_user(id).await.map_err(Into::into)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersInfoError> {
        self.service.create_user(new_user).await.map_err(Into::into)
    }
}
