use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            credit_balances::CreditBalanceEntity,
            usage_logs::{InsertUsageLogEntity, UsageLogEntity},
        },
        repositories::usage_logs::UsageLogRepository,
        value_objects::{
            enums::session_statuses::SessionStatus,
            metering::{SessionCharge, SessionChargeOutcome},
        },
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        repositories::credit_balances::deduct_balance,
        schema::{credit_balances, usage_logs},
    },
};

pub struct UsageLogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UsageLogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UsageLogRepository for UsageLogPostgres {
    async fn create(&self, insert_usage_log_entity: InsertUsageLogEntity) -> Result<UsageLogEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(usage_logs::table)
            .values(&insert_usage_log_entity)
            .returning(UsageLogEntity::as_returning())
            .get_result::<UsageLogEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_for_user(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<UsageLogEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = usage_logs::table
            .filter(usage_logs::id.eq(session_id))
            .filter(usage_logs::user_id.eq(user_id))
            .select(UsageLogEntity::as_select())
            .first::<UsageLogEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn charge(&self, charge: SessionCharge) -> Result<Option<SessionChargeOutcome>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Lock order is usage log, then balance.
        let outcome = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let Some(log) = usage_logs::table
                .filter(usage_logs::id.eq(charge.session_id))
                .filter(usage_logs::status.eq(SessionStatus::Active.to_string()))
                .select(UsageLogEntity::as_select())
                .for_update()
                .first::<UsageLogEntity>(conn)
                .optional()?
            else {
                return Ok(None);
            };

            let owed = (charge.billable_seconds - log.billed_seconds).max(0);
            let mut charged_seconds = 0;
            let mut balance = None;

            if let Some(balance_id) = charge.balance_id {
                let locked = credit_balances::table
                    .filter(credit_balances::id.eq(balance_id))
                    .select(CreditBalanceEntity::as_select())
                    .for_update()
                    .first::<CreditBalanceEntity>(conn)
                    .optional()?;

                balance = match locked {
                    Some(row) if owed > 0 && row.balance_seconds > 0 => {
                        charged_seconds = owed.min(row.balance_seconds);
                        deduct_balance(conn, balance_id, charged_seconds)?
                    }
                    other => other,
                };
            }

            let (status, session_end) = if charge.finalize {
                (SessionStatus::Completed, Some(charge.at))
            } else {
                (SessionStatus::Active, None)
            };

            let usage_log = update(usage_logs::table)
                .filter(usage_logs::id.eq(log.id))
                .set((
                    usage_logs::duration_seconds.eq(charge.billable_seconds),
                    usage_logs::billed_seconds.eq(log.billed_seconds + charged_seconds),
                    usage_logs::status.eq(status.to_string()),
                    usage_logs::session_end.eq(session_end),
                ))
                .returning(UsageLogEntity::as_returning())
                .get_result::<UsageLogEntity>(conn)?;

            Ok(Some(SessionChargeOutcome {
                usage_log,
                balance,
                charged_seconds,
            }))
        })?;

        Ok(outcome)
    }

    async fn list_recent_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<UsageLogEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = usage_logs::table
            .filter(usage_logs::user_id.eq(user_id))
            .order((usage_logs::session_start.desc(), usage_logs::id.desc()))
            .limit(limit)
            .select(UsageLogEntity::as_select())
            .load::<UsageLogEntity>(&mut conn)?;

        Ok(results)
    }
}
