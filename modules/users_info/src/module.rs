use std::sync::Arc;

use axum::Router;
use utoipa::OpenApi;

use api_ingress::RestfulModule;

use crate::api::rest::{openapi::UsersApiDoc, routes};
use crate::config::UsersInfoConfig;
use crate::contract::client::UsersInfoApi;
use crate::domain::repo::UsersRepository;
use crate::domain::service::Service;
use crate::gateways::local::UsersInfoLocalClient;
use crate::infra::storage::memory_repo::InMemoryUsersRepository;

/// Users directory module: owns the store and the domain service, and
/// exposes them over REST and as an in-process client.
pub struct UsersInfo {
    service: Arc<Service>,
    config: UsersInfoConfig,
}

impl UsersInfo {
    /// Module backed by the in-memory store, seeded unless `skip_seed` is set.
    pub fn new(config: UsersInfoConfig) -> Self {
        let repo = if config.skip_seed {
            InMemoryUsersRepository::new()
        } else {
            InMemoryUsersRepository::seeded()
        };
        tracing::debug!(users = repo.len(), "users_info store initialized");
        Self::with_repository(Arc::new(repo), config)
    }

    pub fn with_repository(repo: Arc<dyn UsersRepository>, config: UsersInfoConfig) -> Self {
        Self {
            service: Arc::new(Service::new(repo)),
            config,
        }
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn UsersInfoApi> {
        Arc::new(UsersInfoLocalClient::new(self.service.clone()))
    }
}

impl Default for UsersInfo {
    fn default() -> Self {
        Self::new(UsersInfoConfig::default())
    }
}

impl RestfulModule for UsersInfo {
    fn name(&self) -> &'static str {
        "users_info"
    }

    fn register_rest(&self, router: Router) -> anyhow::Result<Router> {
        tracing::info!("users_info: registering REST routes");
        routes::register_routes(router, self.service.clone(), self.config.clone())
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        UsersApiDoc::openapi()
    }
}
