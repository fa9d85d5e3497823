use crate::{
    application::usecases::{credit_ledger::CreditLedger, session_accounting::SessionAccountingUseCase},
    auth::AuthUser,
    domain::{
        repositories::{credit_balances::CreditBalanceRepository, usage_logs::UsageLogRepository},
        value_objects::metering::{
            EndSessionRequest, HeartbeatRequest, StartSessionRequest, UsageHistoryQuery,
        },
    },
    infrastructure::{
        axum_http::error_responses::AppError,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{credit_balances::CreditBalancePostgres, usage_logs::UsageLogPostgres},
        },
    },
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;
use tracing::info;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let usage_log_repository = UsageLogPostgres::new(Arc::clone(&db_pool));
    let credit_balance_repository = CreditBalancePostgres::new(Arc::clone(&db_pool));

    let ledger = CreditLedger::new(Arc::new(credit_balance_repository));
    let usecase = SessionAccountingUseCase::new(Arc::new(usage_log_repository), Arc::new(ledger));

    Router::new()
        .route("/start", post(start_session))
        .route("/heartbeat", post(heartbeat))
        .route("/end", post(end_session))
        .route("/balance", get(balance))
        .route("/history", get(history))
        .with_state(Arc::new(usecase))
}

pub async fn start_session<U, C>(
    State(usecase): State<Arc<SessionAccountingUseCase<U, C>>>,
    AuthUser { user_id, .. }: AuthUser,
    body: Bytes,
) -> impl IntoResponse
where
    U: UsageLogRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    info!(%user_id, "usage: start request received");
    let request = match parse_start_request(&body) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    match usecase.start(user_id, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn heartbeat<U, C>(
    State(usecase): State<Arc<SessionAccountingUseCase<U, C>>>,
    AuthUser { user_id, .. }: AuthUser,
    WithRejection(Json(request), _): WithRejection<Json<HeartbeatRequest>, AppError>,
) -> impl IntoResponse
where
    U: UsageLogRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    match usecase.heartbeat(user_id, request).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn end_session<U, C>(
    State(usecase): State<Arc<SessionAccountingUseCase<U, C>>>,
    AuthUser { user_id, .. }: AuthUser,
    WithRejection(Json(request), _): WithRejection<Json<EndSessionRequest>, AppError>,
) -> impl IntoResponse
where
    U: UsageLogRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    info!(%user_id, session_id = %request.session_id, "usage: end request received");
    match usecase.end(user_id, request).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn balance<U, C>(
    State(usecase): State<Arc<SessionAccountingUseCase<U, C>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> impl IntoResponse
where
    U: UsageLogRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    match usecase.get_balance(user_id).await {
        Ok(balance) => Json(balance).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn history<U, C>(
    State(usecase): State<Arc<SessionAccountingUseCase<U, C>>>,
    AuthUser { user_id, .. }: AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<UsageHistoryQuery>, AppError>,
) -> impl IntoResponse
where
    U: UsageLogRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    match usecase.usage_history(user_id, query.limit).await {
        Ok(history) => Json(history).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

/// The start body is optional. An empty body means no scenario; anything else must be a
/// valid request.
fn parse_start_request(body: &[u8]) -> Result<StartSessionRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(StartSessionRequest::default());
    }

    serde_json::from_slice(body).map_err(|err| {
        AppError::Validation(format!("Failed to deserialize the JSON body: {}", err))
    })
}
