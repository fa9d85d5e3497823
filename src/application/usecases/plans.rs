use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::domain::{repositories::plans::PlanRepository, value_objects::plans::PlanDto};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PlanError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PlanError::NotFound => StatusCode::NOT_FOUND,
            PlanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PlanError>;

/// Read-only view of the plan catalog.
pub struct PlansUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
}

impl<P> PlansUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>) -> Self {
        Self { plan_repo }
    }

    pub async fn list_plans(&self) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self.plan_repo.list_active_plans().await.map_err(|err| {
            error!(db_error = ?err, "plans: failed to list plans");
            PlanError::Internal(err)
        })?;

        info!(count = plans.len(), "plans: listed active plans");
        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    pub async fn get_plan(&self, plan_id: String) -> UseCaseResult<PlanDto> {
        self.plan_repo
            .find_active_plan_by_id(plan_id.clone())
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to load plan");
                PlanError::Internal(err)
            })?
            .map(PlanDto::from)
            .ok_or(PlanError::NotFound)
    }
}
