use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::usage_logs::{InsertUsageLogEntity, UsageLogEntity},
    value_objects::metering::{SessionCharge, SessionChargeOutcome},
};

#[async_trait]
#[automock]
pub trait UsageLogRepository {
    async fn create(&self, insert_usage_log_entity: InsertUsageLogEntity) -> Result<UsageLogEntity>;

    async fn find_for_user(&self, session_id: Uuid, user_id: Uuid)
    -> Result<Option<UsageLogEntity>>;

    /// Applies `charge` to the session if it is still `active`, deducting at most the
    /// balance left and never more than `billable_seconds - billed_seconds`. Returns `None`
    /// when the log is already completed; completed logs are never touched again.
    async fn charge(&self, charge: SessionCharge) -> Result<Option<SessionChargeOutcome>>;

    /// Most recent first.
    async fn list_recent_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<UsageLogEntity>>;
}
