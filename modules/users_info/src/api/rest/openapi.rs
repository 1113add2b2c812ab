use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};

#[derive(OpenApi)]
#[openapi(
    paths(handlers::list_users, handlers::get_user, handlers::create_user),
    components(schemas(dto::UserDto, dto::CreateUserReq)),
    tags((name = "users", description = "In-memory user directory"))
)]
pub struct UsersApiDoc;
