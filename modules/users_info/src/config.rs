use serde::{Deserialize, Serialize};

/// Configuration for the users_info module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersInfoConfig {
    /// Answer `GET /users/{id}` for an unknown id with 404 instead of a `null` body.
    #[serde(default)]
    pub strict_not_found: bool,
    /// Start with an empty store instead of the three fixed seed users.
    #[serde(default)]
    pub skip_seed: bool,
}
