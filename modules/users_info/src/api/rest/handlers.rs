use std::sync::Arc;

use axum::{extract::Path, response::Json, Extension};
use tracing::info;

use api_ingress::{error::ErrorBody, AppError};

use crate::api::rest::dto::{CreateUserReq, UserDto};
use crate::api::rest::error::map_domain_error;
use crate::config::UsersInfoConfig;
use crate::domain::service::Service;

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    operation_id = "users_info.list_users",
    responses(
        (status = 200, description = "All users in insertion order", body = [UserDto]),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
) -> Result<Json<Vec<UserDto>>, AppError> {
    let users = svc.list_users().await.map_err(|e| map_domain_error(&e))?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

/// Get a user by id.
///
/// An unknown id answers 200 with a `null` body unless the module runs
/// with `strict_not_found`, in which case it answers 404.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users_info.get_user",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User, or null when no user has this id", body = UserDto),
        (status = 404, description = "Not Found (strict mode only)", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    Extension(cfg): Extension<UsersInfoConfig>,
    Path(id): Path<i64>,
) -> Result<Json<Option<UserDto>>, AppError> {
    let user = if cfg.strict_not_found {
        Some(svc.get_user(id).await.map_err(|e| map_domain_error(&e))?)
    } else {
        svc.find_user(id).await.map_err(|e| map_domain_error(&e))?
    };
    Ok(Json(user.map(UserDto::from)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    operation_id = "users_info.create_user",
    request_body = CreateUserReq,
    responses(
        (status = 200, description = "Created user with its assigned id", body = UserDto),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    Json(req): Json<CreateUserReq>,
) -> Result<Json<UserDto>, AppError> {
    info!("Creating user: {:?}", req);

    let user = svc
        .create_user(req.into())
        .await
        .map_err(|e| map_domain_error(&e))?;
    Ok(Json(UserDto::from(user)))
}
