use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::credit_ledger::{self, CreditLedger},
    auth::{self, AuthTokens},
    domain::{
        entities::subscriptions::InsertSubscriptionEntity,
        repositories::{
            credit_balances::CreditBalanceRepository, subscriptions::SubscriptionRepository,
            users::UserRepository,
        },
        value_objects::{
            enums::{
                credit_types::CreditType, subscription_statuses::SubscriptionStatus,
                user_statuses::UserStatus,
            },
            iam::{
                AccountEnrollment, AuthSessionDto, LoginModel, MeDto, RegisterUserModel,
                SubscriptionDto, UserDto,
            },
            metering::BalanceDto,
            plans::{FREE_GRANT_SECONDS, FREE_PERIOD_DAYS, FREE_PLAN_ID},
        },
    },
};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("{0}")]
    Validation(String),
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthenticationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AuthenticationError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthenticationError::EmailTaken => StatusCode::CONFLICT,
            AuthenticationError::InvalidCredentials | AuthenticationError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AuthenticationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AuthenticationError>;

pub struct AuthenticationUseCase<U, S, C>
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    subscription_repo: Arc<S>,
    ledger: Arc<CreditLedger<C>>,
    tokens: Arc<AuthTokens>,
}

impl<U, S, C> AuthenticationUseCase<U, S, C>
where
    U: UserRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        subscription_repo: Arc<S>,
        ledger: Arc<CreditLedger<C>>,
        tokens: Arc<AuthTokens>,
    ) -> Self {
        Self {
            user_repo,
            subscription_repo,
            ledger,
            tokens,
        }
    }

    pub fn tokens(&self) -> &AuthTokens {
        &self.tokens
    }

    /// Creates the account, enrolls it in the free plan with its starter grant and
    /// signs the caller in. The three rows are written atomically.
    pub async fn register(&self, model: RegisterUserModel) -> UseCaseResult<AuthSessionDto> {
        let email = model.email.trim();
        validate_email(email)?;
        validate_password(&model.password)?;

        if self.user_repo.find_by_email(email.to_string()).await?.is_some() {
            info!(email, "authentication: email already registered");
            return Err(AuthenticationError::EmailTaken);
        }

        let password_hash = auth::hash_password(&model.password)?;
        let enrollment = free_enrollment(&model, password_hash)?;

        let user = self
            .user_repo
            .register(enrollment)
            .await
            .map_err(|err| {
                error!(email, db_error = ?err, "authentication: failed to register user");
                AuthenticationError::Internal(err)
            })?;

        let token = self.tokens.issue(user.id, &user.email)?;
        info!(user_id = %user.id, "authentication: user registered");

        Ok(AuthSessionDto {
            token,
            user: UserDto::from(user),
        })
    }

    /// Every failure mode answers with the same `InvalidCredentials`.
    pub async fn login(&self, model: LoginModel) -> UseCaseResult<AuthSessionDto> {
        let email = model.email.trim();
        if email.is_empty() || model.password.is_empty() {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let Some(user) = self.user_repo.find_by_email(email.to_string()).await? else {
            info!("authentication: login for unknown email");
            return Err(AuthenticationError::InvalidCredentials);
        };

        let password_ok = match auth::verify_password(&model.password, &user.password_hash) {
            Ok(ok) => ok,
            Err(err) => {
                error!(user_id = %user.id, error = ?err, "authentication: unusable password hash");
                false
            }
        };
        if !password_ok {
            info!(user_id = %user.id, "authentication: wrong password");
            return Err(AuthenticationError::InvalidCredentials);
        }

        if UserStatus::from_str(&user.status) != UserStatus::Active {
            warn!(user_id = %user.id, status = %user.status, "authentication: login for inactive user");
            return Err(AuthenticationError::InvalidCredentials);
        }

        if let Err(err) = self.user_repo.update_last_login(user.id).await {
            warn!(user_id = %user.id, db_error = ?err, "authentication: failed to record last login");
        }

        let token = self.tokens.issue(user.id, &user.email)?;
        info!(user_id = %user.id, "authentication: user logged in");

        Ok(AuthSessionDto {
            token,
            user: UserDto::from(user),
        })
    }

    pub async fn me(&self, user_id: Uuid) -> UseCaseResult<MeDto> {
        let Some(user) = self.user_repo.find_active_by_id(user_id).await? else {
            warn!(%user_id, "authentication: token for missing or inactive user");
            return Err(AuthenticationError::Unauthorized);
        };

        let subscription = self
            .subscription_repo
            .find_current_active_subscription(user_id)
            .await?
            .map(SubscriptionDto::from);

        let balance = self
            .ledger
            .get_active_balance(user_id)
            .await?
            .map(BalanceDto::from)
            .unwrap_or_else(BalanceDto::zero);

        Ok(MeDto {
            user: UserDto::from(user),
            subscription,
            balance,
        })
    }
}

/// User, free-plan subscription and starter grant for a new account, linked by ids
/// generated here so they can be written in one transaction.
fn free_enrollment(
    model: &RegisterUserModel,
    password_hash: String,
) -> UseCaseResult<AccountEnrollment> {
    let user_id = Uuid::new_v4();
    let subscription_id = Uuid::new_v4();
    let now = Utc::now();
    let period_end = now + Duration::days(FREE_PERIOD_DAYS);

    let free_grant = credit_ledger::new_grant(
        user_id,
        Some(subscription_id),
        FREE_GRANT_SECONDS,
        CreditType::Free,
        now,
        period_end,
    )?;

    Ok(AccountEnrollment {
        user: model.to_entity(user_id, password_hash),
        subscription: InsertSubscriptionEntity {
            id: subscription_id,
            user_id,
            plan_id: FREE_PLAN_ID.to_string(),
            status: SubscriptionStatus::Active.to_string(),
            current_period_start: now,
            current_period_end: period_end,
            cancel_at_period_end: false,
            created_at: now,
            updated_at: now,
        },
        free_grant,
    })
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn validate_email(email: &str) -> UseCaseResult<()> {
    let invalid = || AuthenticationError::Validation("invalid email address".to_string());

    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

pub fn validate_password(password: &str) -> UseCaseResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthenticationError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AuthenticationError::Validation(
            "password must contain a letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthenticationError::Validation(
            "password must contain a number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{config_model::Auth, stage::Stage},
        domain::{
            entities::users::UserEntity,
            repositories::{
                credit_balances::MockCreditBalanceRepository,
                subscriptions::MockSubscriptionRepository, users::MockUserRepository,
            },
        },
    };

    fn tokens() -> Arc<AuthTokens> {
        Arc::new(AuthTokens::new(
            &Auth {
                jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
                cookie_name: "auth_token".to_string(),
                token_ttl_seconds: 7 * 24 * 60 * 60,
            },
            Stage::Local,
        ))
    }

    fn usecase(
        user_repo: MockUserRepository,
        subscription_repo: MockSubscriptionRepository,
        credit_balance_repo: MockCreditBalanceRepository,
    ) -> AuthenticationUseCase<MockUserRepository, MockSubscriptionRepository, MockCreditBalanceRepository>
    {
        AuthenticationUseCase::new(
            Arc::new(user_repo),
            Arc::new(subscription_repo),
            Arc::new(CreditLedger::new(Arc::new(credit_balance_repo))),
            tokens(),
        )
    }

    fn stored_user(email: &str, password: &str) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: auth::hash_password(password).unwrap(),
            name: None,
            email_verified: false,
            status: "active".to_string(),
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.co").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("ana example@x.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@@example.com").is_err());
        assert!(validate_email("ana@.com").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("hunter22").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
        assert!(validate_password("12345678").is_err());
    }

    #[tokio::test]
    async fn register_enrolls_free_plan_with_starter_grant_in_one_write() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(|_| Box::pin(async { Ok(None) }));
        user_repo
            .expect_register()
            .withf(|enrollment| {
                let user = &enrollment.user;
                let subscription = &enrollment.subscription;
                let grant = &enrollment.free_grant;
                user.email == "ana@example.com"
                    && subscription.user_id == user.id
                    && subscription.plan_id == FREE_PLAN_ID
                    && subscription.status == "active"
                    && grant.user_id == user.id
                    && grant.subscription_id == Some(subscription.id)
                    && grant.balance_seconds == FREE_GRANT_SECONDS
                    && grant.original_balance_seconds == FREE_GRANT_SECONDS
                    && grant.type_ == "free"
                    && grant.period_end == subscription.current_period_end
            })
            .times(1)
            .returning(|enrollment| {
                let entity = enrollment.user;
                let user = UserEntity {
                    id: entity.id,
                    email: entity.email,
                    password_hash: entity.password_hash,
                    name: entity.name,
                    email_verified: entity.email_verified,
                    status: entity.status,
                    last_login_at: None,
                    created_at: entity.created_at,
                };
                Box::pin(async move { Ok(user) })
            });

        // Nothing is written outside the enrollment transaction.
        let mut credit_balance_repo = MockCreditBalanceRepository::new();
        credit_balance_repo.expect_grant().never();

        let usecase = usecase(user_repo, MockSubscriptionRepository::new(), credit_balance_repo);
        let session = usecase
            .register(RegisterUserModel {
                email: "  ana@example.com ".to_string(),
                password: "hunter22".to_string(),
                name: Some("Ana".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(session.user.email, "ana@example.com");
        let verified = usecase.tokens().verify(&session.token).unwrap();
        assert_eq!(verified.user_id, session.user.id);
    }

    #[tokio::test]
    async fn failed_enrollment_issues_no_session() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(|_| Box::pin(async { Ok(None) }));
        user_repo
            .expect_register()
            .times(1)
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("grant insert failed")) }));

        let mut credit_balance_repo = MockCreditBalanceRepository::new();
        credit_balance_repo.expect_grant().never();

        let result = usecase(user_repo, MockSubscriptionRepository::new(), credit_balance_repo)
            .register(RegisterUserModel {
                email: "ana@example.com".to_string(),
                password: "hunter22".to_string(),
                name: None,
            })
            .await;

        assert!(matches!(result, Err(AuthenticationError::Internal(_))));
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let existing = stored_user("ana@example.com", "hunter22");
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(move |_| {
            let existing = existing.clone();
            Box::pin(async move { Ok(Some(existing)) })
        });
        user_repo.expect_register().never();

        let result = usecase(
            user_repo,
            MockSubscriptionRepository::new(),
            MockCreditBalanceRepository::new(),
        )
        .register(RegisterUserModel {
            email: "ana@example.com".to_string(),
            password: "hunter22".to_string(),
            name: None,
        })
        .await;

        assert!(matches!(result, Err(AuthenticationError::EmailTaken)));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let existing = stored_user("ana@example.com", "hunter22");
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(move |email| {
            let found = (email == "ana@example.com").then(|| existing.clone());
            Box::pin(async move { Ok(found) })
        });
        user_repo.expect_update_last_login().never();

        let usecase = usecase(
            user_repo,
            MockSubscriptionRepository::new(),
            MockCreditBalanceRepository::new(),
        );

        let wrong_password = usecase
            .login(LoginModel {
                email: "ana@example.com".to_string(),
                password: "hunter23".to_string(),
            })
            .await;
        let unknown_email = usecase
            .login(LoginModel {
                email: "bob@example.com".to_string(),
                password: "hunter22".to_string(),
            })
            .await;

        assert!(matches!(wrong_password, Err(AuthenticationError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AuthenticationError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_records_last_login() {
        let existing = stored_user("ana@example.com", "hunter22");
        let user_id = existing.id;
        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_email().returning(move |_| {
            let existing = existing.clone();
            Box::pin(async move { Ok(Some(existing)) })
        });
        user_repo
            .expect_update_last_login()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(|_| Box::pin(async { Ok(()) }));

        let session = usecase(
            user_repo,
            MockSubscriptionRepository::new(),
            MockCreditBalanceRepository::new(),
        )
        .login(LoginModel {
            email: "ana@example.com".to_string(),
            password: "hunter22".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(session.user.id, user_id);
    }

    #[tokio::test]
    async fn me_for_missing_user_is_unauthorized() {
        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_active_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let result = usecase(
            user_repo,
            MockSubscriptionRepository::new(),
            MockCreditBalanceRepository::new(),
        )
        .me(Uuid::new_v4())
        .await;

        assert!(matches!(result, Err(AuthenticationError::Unauthorized)));
    }
}
