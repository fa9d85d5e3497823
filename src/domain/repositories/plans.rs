use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::plans::PlanEntity;

#[async_trait]
#[automock]
pub trait PlanRepository {
    async fn find_active_plan_by_id(&self, plan_id: String) -> Result<Option<PlanEntity>>;

    /// Active plans, cheapest first.
    async fn list_active_plans(&self) -> Result<Vec<PlanEntity>>;
}
