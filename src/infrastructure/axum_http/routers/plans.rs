use crate::{
    application::usecases::plans::PlansUseCase,
    domain::repositories::plans::PlanRepository,
    infrastructure::{
        axum_http::error_responses::AppError,
        postgres::{postgres_connection::PgPoolSquad, repositories::plans::PlanPostgres},
    },
};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;

/// The catalog is public; no authentication required.
pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let usecase = PlansUseCase::new(Arc::new(plan_repository));

    Router::new()
        .route("/", get(list_plans))
        .route("/:plan_id", get(get_plan))
        .with_state(Arc::new(usecase))
}

pub async fn list_plans<P>(State(usecase): State<Arc<PlansUseCase<P>>>) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    match usecase.list_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn get_plan<P>(
    State(usecase): State<Arc<PlansUseCase<P>>>,
    Path(plan_id): Path<String>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    match usecase.get_plan(plan_id).await {
        Ok(plan) => Json(plan).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
