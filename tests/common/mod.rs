#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use paws::{
    application::usecases::{credit_ledger::CreditLedger, session_accounting::SessionAccountingUseCase},
    domain::{
        entities::{
            credit_balances::{CreditBalanceEntity, InsertCreditBalanceEntity},
            usage_logs::{InsertUsageLogEntity, UsageLogEntity},
        },
        repositories::{credit_balances::CreditBalanceRepository, usage_logs::UsageLogRepository},
        value_objects::{
            enums::credit_types::CreditType,
            metering::{SessionCharge, SessionChargeOutcome},
        },
    },
};
use uuid::Uuid;

/// Mirrors the conditional statements the Postgres repositories issue.
#[derive(Default)]
pub struct InMemoryCreditBalances {
    rows: Mutex<Vec<CreditBalanceEntity>>,
}

impl InMemoryCreditBalances {
    pub fn rows(&self) -> Vec<CreditBalanceEntity> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert(&self, row: CreditBalanceEntity) {
        self.rows.lock().unwrap().push(row);
    }
}

#[async_trait]
impl CreditBalanceRepository for InMemoryCreditBalances {
    async fn find_active_balance(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<CreditBalanceEntity>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|row| row.user_id == user_id && row.period_end > now && row.balance_seconds > 0)
            .min_by_key(|row| row.period_end)
            .cloned())
    }

    async fn find_by_id(&self, balance_id: Uuid) -> Result<Option<CreditBalanceEntity>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|row| row.id == balance_id).cloned())
    }

    async fn grant(&self, entity: InsertCreditBalanceEntity) -> Result<CreditBalanceEntity> {
        let row = CreditBalanceEntity {
            id: Uuid::new_v4(),
            user_id: entity.user_id,
            subscription_id: entity.subscription_id,
            balance_seconds: entity.balance_seconds,
            original_balance_seconds: entity.original_balance_seconds,
            period_start: entity.period_start,
            period_end: entity.period_end,
            type_: entity.type_,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn deduct(&self, balance_id: Uuid, seconds: i32) -> Result<Option<CreditBalanceEntity>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .find(|row| row.id == balance_id && row.balance_seconds > 0)
        else {
            return Ok(None);
        };
        row.balance_seconds = (row.balance_seconds - seconds).max(0);
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }
}

/// Charges against the shared balances, locking logs before balances like the
/// Postgres transaction does.
pub struct InMemoryUsageLogs {
    rows: Mutex<Vec<UsageLogEntity>>,
    balances: Arc<InMemoryCreditBalances>,
}

impl InMemoryUsageLogs {
    pub fn new(balances: Arc<InMemoryCreditBalances>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            balances,
        }
    }

    pub fn get(&self, session_id: Uuid) -> Option<UsageLogEntity> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == session_id)
            .cloned()
    }
}

#[async_trait]
impl UsageLogRepository for InMemoryUsageLogs {
    async fn create(&self, entity: InsertUsageLogEntity) -> Result<UsageLogEntity> {
        let row = UsageLogEntity {
            id: Uuid::new_v4(),
            user_id: entity.user_id,
            session_start: entity.session_start,
            session_end: None,
            duration_seconds: entity.duration_seconds,
            billed_seconds: entity.billed_seconds,
            scenario_id: entity.scenario_id,
            subscription_id: entity.subscription_id,
            status: entity.status,
            created_at: entity.created_at,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find_for_user(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<UsageLogEntity>> {
        Ok(self
            .get(session_id)
            .filter(|row| row.user_id == user_id))
    }

    async fn charge(&self, charge: SessionCharge) -> Result<Option<SessionChargeOutcome>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .find(|row| row.id == charge.session_id && row.status == "active")
        else {
            return Ok(None);
        };

        let owed = (charge.billable_seconds - row.billed_seconds).max(0);
        let mut charged_seconds = 0;
        let mut balance = None;

        if let Some(balance_id) = charge.balance_id {
            let mut balances = self.balances.rows.lock().unwrap();
            if let Some(balance_row) = balances.iter_mut().find(|b| b.id == balance_id) {
                if owed > 0 && balance_row.balance_seconds > 0 {
                    charged_seconds = owed.min(balance_row.balance_seconds);
                    balance_row.balance_seconds -= charged_seconds;
                    balance_row.updated_at = Utc::now();
                }
                balance = Some(balance_row.clone());
            }
        }

        row.duration_seconds = charge.billable_seconds;
        row.billed_seconds += charged_seconds;
        if charge.finalize {
            row.status = "completed".to_string();
            row.session_end = Some(charge.at);
        }

        Ok(Some(SessionChargeOutcome {
            usage_log: row.clone(),
            balance,
            charged_seconds,
        }))
    }

    async fn list_recent_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<UsageLogEntity>> {
        let mut rows: Vec<UsageLogEntity> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.session_start.cmp(&a.session_start));
        rows.truncate(usize::try_from(limit).map_err(|_| anyhow!("negative limit"))?);
        Ok(rows)
    }
}

pub struct Harness {
    pub balances: Arc<InMemoryCreditBalances>,
    pub usage_logs: Arc<InMemoryUsageLogs>,
    pub ledger: Arc<CreditLedger<InMemoryCreditBalances>>,
    pub accounting: SessionAccountingUseCase<InMemoryUsageLogs, InMemoryCreditBalances>,
}

impl Harness {
    pub fn new() -> Self {
        let balances = Arc::new(InMemoryCreditBalances::default());
        let usage_logs = Arc::new(InMemoryUsageLogs::new(Arc::clone(&balances)));
        let ledger = Arc::new(CreditLedger::new(Arc::clone(&balances)));
        let accounting = SessionAccountingUseCase::new(Arc::clone(&usage_logs), Arc::clone(&ledger));

        Self {
            balances,
            usage_logs,
            ledger,
            accounting,
        }
    }

    /// Grants `balance_seconds` left out of an `original_seconds` grant, valid for 30 days.
    pub fn seed_balance(
        &self,
        user_id: Uuid,
        credit_type: CreditType,
        original_seconds: i32,
        balance_seconds: i32,
    ) -> CreditBalanceEntity {
        let now = Utc::now();
        let row = CreditBalanceEntity {
            id: Uuid::new_v4(),
            user_id,
            subscription_id: None,
            balance_seconds,
            original_balance_seconds: original_seconds,
            period_start: now,
            period_end: now + Duration::days(30),
            type_: credit_type.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.balances.insert(row.clone());
        row
    }

    pub fn balance_seconds(&self, balance_id: Uuid) -> i32 {
        self.balances
            .rows()
            .into_iter()
            .find(|row| row.id == balance_id)
            .map(|row| row.balance_seconds)
            .unwrap_or_default()
    }

    pub fn assert_balance_invariant(&self) {
        for row in self.balances.rows() {
            assert!(
                0 <= row.balance_seconds && row.balance_seconds <= row.original_balance_seconds,
                "balance {} out of range: {} / {}",
                row.id,
                row.balance_seconds,
                row.original_balance_seconds
            );
        }
    }
}
