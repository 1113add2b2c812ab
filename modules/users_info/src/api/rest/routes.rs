use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::api::rest::handlers;
use crate::config::UsersInfoConfig;
use crate::domain::service::Service;

pub fn register_routes(
    mut router: Router,
    service: Arc<Service>,
    config: UsersInfoConfig,
) -> anyhow::Result<Router> {
    router = router
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/users/{id}", get(handlers::get_user));

    router = router
        .layer(Extension(service))
        .layer(Extension(config));

    Ok(router)
}
