use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::credit_balances::{CreditBalanceEntity, InsertCreditBalanceEntity};

#[async_trait]
#[automock]
pub trait CreditBalanceRepository {
    /// Non-expired (`period_end > now`), positive balance with the soonest `period_end`.
    async fn find_active_balance(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<CreditBalanceEntity>>;

    async fn find_by_id(&self, balance_id: Uuid) -> Result<Option<CreditBalanceEntity>>;

    async fn grant(
        &self,
        insert_credit_balance_entity: InsertCreditBalanceEntity,
    ) -> Result<CreditBalanceEntity>;

    /// Atomically lowers `balance_seconds` by `min(seconds, balance_seconds)` in a single
    /// conditional statement. Returns the updated row, or `None` when nothing was deducted.
    async fn deduct(&self, balance_id: Uuid, seconds: i32) -> Result<Option<CreditBalanceEntity>>;
}
