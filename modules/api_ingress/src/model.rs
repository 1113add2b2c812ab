use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Two-field text envelope returned by the health and info endpoints.
///
/// For health `timestamp` holds the server's local time; for info it
/// carries the version detail string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub message: String,
    pub timestamp: String,
}

impl Message {
    pub fn new(message: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }
}
