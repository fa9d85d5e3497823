use crate::{
    application::usecases::{
        authentication::{AuthenticationError, AuthenticationUseCase},
        credit_ledger::CreditLedger,
    },
    auth::{AuthTokens, AuthUser},
    domain::{
        repositories::{
            credit_balances::CreditBalanceRepository, subscriptions::SubscriptionRepository,
            users::UserRepository,
        },
        value_objects::iam::{LoginModel, RegisterUserModel},
    },
    infrastructure::{
        axum_http::error_responses::AppError,
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                credit_balances::CreditBalancePostgres, subscriptions::SubscriptionPostgres,
                users::UserPostgres,
            },
        },
    },
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::{WithRejection, cookie::CookieJar};
use std::sync::Arc;
use tracing::info;

pub fn routes(db_pool: Arc<PgPoolSquad>, tokens: Arc<AuthTokens>) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let subscription_repository = SubscriptionPostgres::new(Arc::clone(&db_pool));
    let credit_balance_repository = CreditBalancePostgres::new(Arc::clone(&db_pool));

    let ledger = CreditLedger::new(Arc::new(credit_balance_repository));
    let usecase = AuthenticationUseCase::new(
        Arc::new(user_repository),
        Arc::new(subscription_repository),
        Arc::new(ledger),
        tokens,
    );

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(Arc::new(usecase))
}

pub async fn register<U, S, C>(
    State(usecase): State<Arc<AuthenticationUseCase<U, S, C>>>,
    jar: CookieJar,
    WithRejection(Json(register_user_model), _): WithRejection<
        Json<RegisterUserModel>,
        AppError,
    >,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    match usecase.register(register_user_model).await {
        Ok(session) => {
            let cookie = usecase.tokens().session_cookie(session.token.clone());
            (StatusCode::CREATED, jar.add(cookie), Json(session)).into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn login<U, S, C>(
    State(usecase): State<Arc<AuthenticationUseCase<U, S, C>>>,
    jar: CookieJar,
    WithRejection(Json(login_model), _): WithRejection<Json<LoginModel>, AppError>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    match usecase.login(login_model).await {
        Ok(session) => {
            let cookie = usecase.tokens().session_cookie(session.token.clone());
            (jar.add(cookie), Json(session)).into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

/// Tokens are stateless; logging out only expires the cookie.
pub async fn logout<U, S, C>(
    State(usecase): State<Arc<AuthenticationUseCase<U, S, C>>>,
    jar: CookieJar,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    info!("authentication: logout");
    (
        StatusCode::NO_CONTENT,
        jar.add(usecase.tokens().removal_cookie()),
    )
        .into_response()
}

pub async fn me<U, S, C>(
    State(usecase): State<Arc<AuthenticationUseCase<U, S, C>>>,
    AuthUser { user_id, .. }: AuthUser,
    jar: CookieJar,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    match usecase.me(user_id).await {
        Ok(me) => Json(me).into_response(),
        Err(AuthenticationError::Unauthorized) => (
            jar.add(usecase.tokens().removal_cookie()),
            AppError::Unauthorized,
        )
            .into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
