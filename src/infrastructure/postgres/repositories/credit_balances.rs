use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{PgConnection, RunQueryDsl, insert_into, prelude::*, sql_types::Integer, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::credit_balances::{CreditBalanceEntity, InsertCreditBalanceEntity},
        repositories::credit_balances::CreditBalanceRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::credit_balances},
};

diesel::define_sql_function! {
    fn greatest(a: Integer, b: Integer) -> Integer;
}

/// Takes up to `seconds` off a positive balance, flooring at zero. Single statement so
/// concurrent deductions serialize on the row lock. Shared with the session charge
/// transaction.
pub(crate) fn deduct_balance(
    conn: &mut PgConnection,
    balance_id: Uuid,
    seconds: i32,
) -> QueryResult<Option<CreditBalanceEntity>> {
    update(credit_balances::table)
        .filter(credit_balances::id.eq(balance_id))
        .filter(credit_balances::balance_seconds.gt(0))
        .set((
            credit_balances::balance_seconds
                .eq(greatest(credit_balances::balance_seconds - seconds, 0)),
            credit_balances::updated_at.eq(Utc::now()),
        ))
        .returning(CreditBalanceEntity::as_returning())
        .get_result::<CreditBalanceEntity>(conn)
        .optional()
}

pub struct CreditBalancePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CreditBalancePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CreditBalanceRepository for CreditBalancePostgres {
    async fn find_active_balance(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<CreditBalanceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = credit_balances::table
            .filter(credit_balances::user_id.eq(user_id))
            .filter(credit_balances::period_end.gt(now))
            .filter(credit_balances::balance_seconds.gt(0))
            .order(credit_balances::period_end.asc())
            .select(CreditBalanceEntity::as_select())
            .first::<CreditBalanceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_by_id(&self, balance_id: Uuid) -> Result<Option<CreditBalanceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = credit_balances::table
            .filter(credit_balances::id.eq(balance_id))
            .select(CreditBalanceEntity::as_select())
            .first::<CreditBalanceEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn grant(
        &self,
        insert_credit_balance_entity: InsertCreditBalanceEntity,
    ) -> Result<CreditBalanceEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(credit_balances::table)
            .values(&insert_credit_balance_entity)
            .returning(CreditBalanceEntity::as_returning())
            .get_result::<CreditBalanceEntity>(&mut conn)?;

        Ok(result)
    }

    async fn deduct(&self, balance_id: Uuid, seconds: i32) -> Result<Option<CreditBalanceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = deduct_balance(&mut conn, balance_id, seconds)?;

        Ok(result)
    }
}
