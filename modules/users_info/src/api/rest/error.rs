use api_ingress::AppError;

use crate::domain::error::DomainError;

/// Map domain errors to HTTP errors
pub fn map_domain_error(err: &DomainError) -> AppError {
    match err {
        DomainError::UserNotFound { id } => {
            AppError::not_found(format!("User with id {id} was not found"))
        }
        DomainError::Storage { message } => AppError::internal(anyhow::anyhow!(message.clone())),
    }
}
