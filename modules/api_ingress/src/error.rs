use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (code, safe_msg) = match &self {
            AppError::NotFound(m) => ("not_found", m.clone()),
            AppError::Internal(err) => {
                tracing::error!(error = %err, status = status.as_u16(), "request failed");
                ("internal_error", "internal error".to_string())
            }
        };

        if !matches!(self, AppError::Internal(_)) {
            tracing::warn!(error = %self, status = status.as_u16(), "request failed");
        }

        let body = ErrorBody {
            code: code.to_string(),
            message: safe_msg,
        };
        (status, Json(body)).into_response()
    }
}
