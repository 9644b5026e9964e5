use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use mercato_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    Core(CoreError),
    Internal(anyhow::Error),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Core(err) => {
                let status = match &err {
                    CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    CoreError::InvalidState { .. } => StatusCode::CONFLICT,
                    CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                    CoreError::AlreadyExists(_) => StatusCode::CONFLICT,
                    CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
