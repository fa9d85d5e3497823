use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::application::usecases::{
    authentication::AuthenticationError, plans::PlanError, session_accounting::MeteringError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Insufficient credits to start a session")]
    InsufficientCredits,

    #[error("No active credits")]
    NoActiveCredits,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InsufficientCredits | AppError::NoActiveCredits => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "Unauthorized",
            AppError::InsufficientCredits => "InsufficientCredits",
            AppError::NoActiveCredits => "NoActiveCredits",
            AppError::Validation(_) => "ValidationError",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        // Don't leak internal error detail to client
        let message = match &self {
            AppError::Internal(err) => {
                error!(error = ?err, "http: internal error");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            kind,
            message,
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MeteringError> for AppError {
    fn from(value: MeteringError) -> Self {
        match value {
            MeteringError::InsufficientCredits => AppError::InsufficientCredits,
            MeteringError::NoActiveCredits => AppError::NoActiveCredits,
            MeteringError::SessionNotFound => AppError::NotFound("session not found".to_string()),
            MeteringError::Validation(message) => AppError::Validation(message),
            MeteringError::Internal(err) => AppError::Internal(err),
        }
    }
}

impl From<AuthenticationError> for AppError {
    fn from(value: AuthenticationError) -> Self {
        match value {
            AuthenticationError::Validation(message) => AppError::Validation(message),
            AuthenticationError::EmailTaken => {
                AppError::Conflict("an account with this email already exists".to_string())
            }
            AuthenticationError::InvalidCredentials | AuthenticationError::Unauthorized => {
                AppError::Unauthorized
            }
            AuthenticationError::Internal(err) => AppError::Internal(err),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(value: PlanError) -> Self {
        match value {
            PlanError::NotFound => AppError::NotFound("plan not found".to_string()),
            PlanError::Internal(err) => AppError::Internal(err),
        }
    }
}
