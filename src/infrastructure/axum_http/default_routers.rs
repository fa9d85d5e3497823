use axum::{http::StatusCode, response::IntoResponse};
use tracing::info;

use crate::infrastructure::axum_http::error_responses::AppError;

pub async fn not_found() -> impl IntoResponse {
    info!("router: not_found handler invoked");
    AppError::NotFound("route not found".to_string()).into_response()
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}
