use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    entities::credit_balances::{CreditBalanceEntity, InsertCreditBalanceEntity},
    repositories::credit_balances::CreditBalanceRepository,
    value_objects::enums::credit_types::CreditType,
};

/// Owns per-user time grants. Grants are append-only rows; spending only ever lowers
/// `balance_seconds` and never below zero.
pub struct CreditLedger<C>
where
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    credit_balance_repo: Arc<C>,
}

impl<C> CreditLedger<C>
where
    C: CreditBalanceRepository + Send + Sync + 'static,
{
    pub fn new(credit_balance_repo: Arc<C>) -> Self {
        Self {
            credit_balance_repo,
        }
    }

    /// Earliest-expiring, non-expired, positive grant. `None` means zero entitlement.
    pub async fn get_active_balance(&self, user_id: Uuid) -> Result<Option<CreditBalanceEntity>> {
        let balance = self
            .credit_balance_repo
            .find_active_balance(user_id, Utc::now())
            .await?;

        match balance.as_ref() {
            Some(balance) => debug!(
                %user_id,
                balance_id = %balance.id,
                balance_seconds = balance.balance_seconds,
                credit_type = %balance.type_,
                "credit_ledger: active balance selected"
            ),
            None => debug!(%user_id, "credit_ledger: no active balance"),
        }

        Ok(balance)
    }

    /// Deducts `min(seconds, balance_seconds)`. Non-positive amounts and already drained
    /// balances are no-ops and return `None`.
    pub async fn deduct(
        &self,
        balance_id: Uuid,
        seconds: i32,
    ) -> Result<Option<CreditBalanceEntity>> {
        if seconds <= 0 {
            debug!(%balance_id, seconds, "credit_ledger: skipping non-positive deduction");
            return Ok(None);
        }

        let updated = self.credit_balance_repo.deduct(balance_id, seconds).await?;

        match updated.as_ref() {
            Some(balance) => info!(
                %balance_id,
                seconds,
                balance_seconds = balance.balance_seconds,
                "credit_ledger: deducted"
            ),
            None => info!(%balance_id, seconds, "credit_ledger: nothing left to deduct"),
        }

        Ok(updated)
    }

    /// Remaining seconds on a specific grant, zero when it no longer exists.
    pub async fn remaining_seconds(&self, balance_id: Uuid) -> Result<i32> {
        Ok(self
            .credit_balance_repo
            .find_by_id(balance_id)
            .await?
            .map(|balance| balance.balance_seconds.max(0))
            .unwrap_or(0))
    }

    pub async fn grant(
        &self,
        user_id: Uuid,
        subscription_id: Option<Uuid>,
        seconds: i32,
        credit_type: CreditType,
        period_end: DateTime<Utc>,
    ) -> Result<CreditBalanceEntity> {
        let insert = new_grant(
            user_id,
            subscription_id,
            seconds,
            credit_type,
            Utc::now(),
            period_end,
        )?;

        let balance = self.credit_balance_repo.grant(insert).await?;

        info!(
            %user_id,
            balance_id = %balance.id,
            seconds,
            credit_type = %credit_type,
            "credit_ledger: granted"
        );

        Ok(balance)
    }
}

/// Validated row for a fresh grant starting at `now`, with `original == balance`.
pub fn new_grant(
    user_id: Uuid,
    subscription_id: Option<Uuid>,
    seconds: i32,
    credit_type: CreditType,
    now: DateTime<Utc>,
    period_end: DateTime<Utc>,
) -> Result<InsertCreditBalanceEntity> {
    if seconds <= 0 {
        bail!("grant must be a positive number of seconds, got {}", seconds);
    }
    if period_end <= now {
        bail!("grant period must end in the future");
    }

    Ok(InsertCreditBalanceEntity {
        user_id,
        subscription_id,
        balance_seconds: seconds,
        original_balance_seconds: seconds,
        period_start: now,
        period_end,
        type_: credit_type.to_string(),
        created_at: now,
        updated_at: now,
    })
}
