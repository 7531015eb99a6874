use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::{errors::AuthError, validation::FieldError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Unauthorized")]
    Unauthenticated,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(details) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Validation failed", "details": details })),
                )
                    .into_response();
            }
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::Auth(AuthError::UserAlreadyExists | AuthError::ConstraintViolation(_)) => {
                (StatusCode::CONFLICT, "Email already exists")
            }
            AppError::Auth(AuthError::UserNotFound) => (StatusCode::NOT_FOUND, "User not found"),
            AppError::Auth(AuthError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials")
            }
            AppError::Auth(e) => {
                error!(error = %e, "unhandled error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
