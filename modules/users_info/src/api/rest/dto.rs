use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{NewUser, User};

/// REST DTO for user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// REST DTO for creating a new user.
///
/// Missing or `null` fields become empty strings. Any `id` in the body is
/// ignored since ids are always assigned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateUserReq {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            name: req.name.unwrap_or_default(),
            email: req.email.unwrap_or_default(),
        }
    }
}
