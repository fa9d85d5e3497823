use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::users::UserEntity,
        repositories::users::UserRepository,
        value_objects::{enums::user_statuses::UserStatus, iam::AccountEnrollment},
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{credit_balances, user_subscriptions, users},
    },
};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn find_by_email(&self, email: String) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = users::table
            .filter(users::email.eq(email))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_active_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = users::table
            .filter(users::id.eq(user_id))
            .filter(users::status.eq(UserStatus::Active.to_string()))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn register(&self, account_enrollment: AccountEnrollment) -> Result<UserEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let user = insert_into(users::table)
                .values(&account_enrollment.user)
                .returning(UserEntity::as_returning())
                .get_result::<UserEntity>(conn)?;

            insert_into(user_subscriptions::table)
                .values(&account_enrollment.subscription)
                .execute(conn)?;

            insert_into(credit_balances::table)
                .values(&account_enrollment.free_grant)
                .execute(conn)?;

            Ok(user)
        })?;

        Ok(result)
    }

    async fn update_last_login(&self, user_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(users::table)
            .filter(users::id.eq(user_id))
            .set(users::last_login_at.eq(Some(Utc::now())))
            .execute(&mut conn)?;

        Ok(())
    }
}
