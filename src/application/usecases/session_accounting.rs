use std::sync::Arc;

use anyhow::Result as AnyResult;
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::usecases::credit_ledger::CreditLedger,
    domain::{
        entities::{
            credit_balances::CreditBalanceEntity,
            usage_logs::{InsertUsageLogEntity, UsageLogEntity},
        },
        repositories::{
            credit_balances::CreditBalanceRepository, usage_logs::UsageLogRepository,
        },
        value_objects::{
            enums::session_statuses::SessionStatus,
            metering::{
                BalanceDto, EndSessionRequest, EndSessionResponse, HeartbeatRequest,
                HeartbeatResponse, SessionCharge, SessionChargeOutcome, StartSessionRequest,
                StartSessionResponse, UsageSummaryDto,
            },
            tier_policy,
        },
    },
};

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
pub const MAX_HISTORY_LIMIT: i64 = 100;
const MAX_SCENARIO_ID_LENGTH: usize = 128;

#[derive(Debug, Error)]
pub enum MeteringError {
    #[error("insufficient credits to start a session")]
    InsufficientCredits,
    #[error("no active credits")]
    NoActiveCredits,
    #[error("session not found")]
    SessionNotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MeteringError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            MeteringError::InsufficientCredits | MeteringError::NoActiveCredits => {
                StatusCode::FORBIDDEN
            }
            MeteringError::SessionNotFound => StatusCode::NOT_FOUND,
            MeteringError::Validation(_) => StatusCode::BAD_REQUEST,
            MeteringError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, MeteringError>;

/// Opens, heartbeats and closes practice sessions, turning reported elapsed time into
/// ledger deductions. Every charge goes through the usage log repository, which bills
/// only the part of a session's billable time not billed yet and stops touching a log
/// once it is `completed`.
pub struct SessionAccountingUseCase<U, C>
where
    U: UsageLogRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    usage_log_repo: Arc<U>,
    ledger: Arc<CreditLedger<C>>,
}

impl<U, C> SessionAccountingUseCase<U, C>
where
    U: UsageLogRepository + Send + Sync + 'static,
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    pub fn new(usage_log_repo: Arc<U>, ledger: Arc<CreditLedger<C>>) -> Self {
        Self {
            usage_log_repo,
            ledger,
        }
    }

    pub async fn start(
        &self,
        user_id: Uuid,
        request: StartSessionRequest,
    ) -> UseCaseResult<StartSessionResponse> {
        let scenario_id = normalize_scenario_id(request.scenario_id)?;
        info!(
            %user_id,
            scenario_id = ?scenario_id,
            "session_accounting: start requested"
        );

        let balance = match self.active_balance(user_id).await? {
            Some(balance) if balance.balance_seconds > 0 => balance,
            _ => {
                warn!(%user_id, "session_accounting: start rejected, no credits");
                return Err(MeteringError::InsufficientCredits);
            }
        };

        let now = Utc::now();
        let log = self
            .usage_log_repo
            .create(InsertUsageLogEntity {
                user_id,
                session_start: now,
                duration_seconds: 0,
                billed_seconds: 0,
                scenario_id,
                subscription_id: balance.subscription_id,
                status: SessionStatus::Active.to_string(),
                created_at: now,
            })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "session_accounting: failed to create usage log");
                MeteringError::Internal(err)
            })?;

        info!(
            %user_id,
            session_id = %log.id,
            available_seconds = balance.balance_seconds,
            credit_type = %balance.type_,
            "session_accounting: session started"
        );

        Ok(StartSessionResponse {
            session_id: log.id,
            available_seconds: balance.balance_seconds,
            credit_type: balance.credit_type(),
        })
    }

    /// The reported elapsed time overwrites the previous value; it is never accumulated.
    /// Each heartbeat charges whatever part of the billable time was not charged yet, so a
    /// session that is never ended is still paid for up to its last heartbeat.
    pub async fn heartbeat(
        &self,
        user_id: Uuid,
        request: HeartbeatRequest,
    ) -> UseCaseResult<HeartbeatResponse> {
        let session_id = request.session_id;
        let elapsed_seconds = validate_elapsed(request.elapsed_seconds)?;
        let log = self.find_session(user_id, session_id).await?;

        if log.session_status() == SessionStatus::Completed {
            info!(%user_id, %session_id, "session_accounting: heartbeat for completed session");
            return self.stopped(user_id).await;
        }

        let Some(balance) = self.active_balance(user_id).await? else {
            warn!(
                %user_id,
                %session_id,
                elapsed_seconds,
                "session_accounting: credits vanished mid-session, finalizing"
            );
            self.apply(&log, None, elapsed_seconds, true).await?;
            return Err(MeteringError::NoActiveCredits);
        };

        let decision = tier_policy::evaluate(&balance, elapsed_seconds, log.billed_seconds);

        let Some(outcome) = self
            .apply(&log, Some(&balance), decision.billable_seconds, decision.should_stop)
            .await?
        else {
            info!(%user_id, %session_id, "session_accounting: session completed concurrently");
            return self.stopped(user_id).await;
        };

        if decision.should_stop {
            info!(
                %user_id,
                %session_id,
                elapsed_seconds,
                billable_seconds = decision.billable_seconds,
                charged_seconds = outcome.charged_seconds,
                credit_type = %balance.type_,
                "session_accounting: forced stop"
            );
            return Ok(HeartbeatResponse {
                should_stop: true,
                available_seconds: outcome.remaining_seconds(),
                grace_period: false,
                grace_seconds_remaining: 0,
            });
        }

        // Another session of the same user drained the balance in between.
        if outcome.remaining_seconds() <= 0 {
            self.apply(&log, Some(&balance), decision.billable_seconds, true)
                .await?;
            info!(
                %user_id,
                %session_id,
                elapsed_seconds,
                charged_seconds = outcome.charged_seconds,
                "session_accounting: balance drained by a concurrent session"
            );
            return Ok(HeartbeatResponse {
                should_stop: true,
                available_seconds: 0,
                grace_period: false,
                grace_seconds_remaining: 0,
            });
        }

        if decision.grace_period {
            info!(
                %user_id,
                %session_id,
                remaining_seconds = outcome.remaining_seconds(),
                "session_accounting: grace period"
            );
        }

        Ok(HeartbeatResponse {
            should_stop: false,
            available_seconds: outcome.remaining_seconds(),
            grace_period: decision.grace_period,
            grace_seconds_remaining: decision.grace_seconds_remaining,
        })
    }

    /// Finalizes unconditionally and charges whatever heartbeats have not charged yet.
    /// Ending an already completed session charges nothing and reports what was recorded.
    pub async fn end(
        &self,
        user_id: Uuid,
        request: EndSessionRequest,
    ) -> UseCaseResult<EndSessionResponse> {
        let session_id = request.session_id;
        let elapsed_seconds = validate_elapsed(request.elapsed_seconds)?;
        let log = self.find_session(user_id, session_id).await?;

        if log.session_status() == SessionStatus::Completed {
            info!(%user_id, %session_id, "session_accounting: end for completed session");
            return Ok(EndSessionResponse {
                seconds_used: log.duration_seconds,
                remaining_seconds: self.available_seconds(user_id).await?,
            });
        }

        let balance = self.active_balance(user_id).await?;
        let billable_seconds = match balance.as_ref() {
            Some(balance) => tier_policy::billable_seconds(balance.credit_type(), elapsed_seconds),
            None => elapsed_seconds,
        };

        let Some(outcome) = self
            .apply(&log, balance.as_ref(), billable_seconds, true)
            .await?
        else {
            info!(%user_id, %session_id, "session_accounting: already finalized");
            let recorded = self.find_session(user_id, session_id).await?;
            return Ok(EndSessionResponse {
                seconds_used: recorded.duration_seconds,
                remaining_seconds: self.available_seconds(user_id).await?,
            });
        };

        if balance.is_none() {
            warn!(
                %user_id,
                %session_id,
                billable_seconds,
                "session_accounting: finalized without billing, no active balance"
            );
        }

        info!(
            %user_id,
            %session_id,
            elapsed_seconds,
            billable_seconds,
            charged_seconds = outcome.charged_seconds,
            billed_seconds = outcome.usage_log.billed_seconds,
            remaining_seconds = outcome.remaining_seconds(),
            "session_accounting: session ended"
        );

        Ok(EndSessionResponse {
            seconds_used: outcome.usage_log.duration_seconds,
            remaining_seconds: outcome.remaining_seconds(),
        })
    }

    pub async fn get_balance(&self, user_id: Uuid) -> UseCaseResult<BalanceDto> {
        Ok(self
            .active_balance(user_id)
            .await?
            .map(BalanceDto::from)
            .unwrap_or_else(BalanceDto::zero))
    }

    pub async fn usage_history(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
    ) -> UseCaseResult<Vec<UsageSummaryDto>> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if limit <= 0 {
            return Err(MeteringError::Validation(
                "limit must be a positive number".to_string(),
            ));
        }
        if limit > MAX_HISTORY_LIMIT {
            return Err(MeteringError::Validation(format!(
                "limit must be <= {}",
                MAX_HISTORY_LIMIT
            )));
        }

        let logs = self
            .usage_log_repo
            .list_recent_for_user(user_id, limit)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "session_accounting: failed to load usage history");
                MeteringError::Internal(err)
            })?;

        Ok(logs.into_iter().map(UsageSummaryDto::from).collect())
    }

    /// `None` when the session was completed by another call in the meantime.
    async fn apply(
        &self,
        log: &UsageLogEntity,
        balance: Option<&CreditBalanceEntity>,
        billable_seconds: i32,
        finalize: bool,
    ) -> UseCaseResult<Option<SessionChargeOutcome>> {
        self.usage_log_repo
            .charge(SessionCharge {
                session_id: log.id,
                balance_id: balance.map(|balance| balance.id),
                billable_seconds,
                finalize,
                at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(session_id = %log.id, db_error = ?err, "session_accounting: failed to charge session");
                MeteringError::Internal(err)
            })
    }

    async fn stopped(&self, user_id: Uuid) -> UseCaseResult<HeartbeatResponse> {
        Ok(HeartbeatResponse {
            should_stop: true,
            available_seconds: self.available_seconds(user_id).await?,
            grace_period: false,
            grace_seconds_remaining: 0,
        })
    }

    async fn find_session(&self, user_id: Uuid, session_id: Uuid) -> UseCaseResult<UsageLogEntity> {
        self.usage_log_repo
            .find_for_user(session_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %session_id, db_error = ?err, "session_accounting: failed to load session");
                MeteringError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, %session_id, "session_accounting: unknown session");
                MeteringError::SessionNotFound
            })
    }

    async fn active_balance(&self, user_id: Uuid) -> AnyResult<Option<CreditBalanceEntity>> {
        self.ledger.get_active_balance(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "session_accounting: failed to load active balance");
            err
        })
    }

    async fn available_seconds(&self, user_id: Uuid) -> UseCaseResult<i32> {
        Ok(self
            .active_balance(user_id)
            .await?
            .map(|balance| balance.balance_seconds)
            .unwrap_or(0))
    }
}

fn validate_elapsed(elapsed_seconds: i32) -> UseCaseResult<i32> {
    if elapsed_seconds < 0 {
        return Err(MeteringError::Validation(
            "elapsedSeconds must not be negative".to_string(),
        ));
    }
    Ok(elapsed_seconds)
}

fn normalize_scenario_id(scenario_id: Option<String>) -> UseCaseResult<Option<String>> {
    let scenario_id = scenario_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    if let Some(id) = scenario_id.as_ref() {
        if id.chars().count() > MAX_SCENARIO_ID_LENGTH {
            return Err(MeteringError::Validation(format!(
                "scenarioId must be at most {} characters",
                MAX_SCENARIO_ID_LENGTH
            )));
        }
    }

    Ok(scenario_id)
}
