use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::credit_types::CreditType,
    infrastructure::postgres::schema::credit_balances,
};

/// A time grant. `0 <= balance_seconds <= original_balance_seconds` holds for every row.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = credit_balances)]
pub struct CreditBalanceEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub balance_seconds: i32,
    pub original_balance_seconds: i32,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub type_: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditBalanceEntity {
    /// Rows with an unknown type are spent like pay-per-use credit: no tier cutoffs, no grace.
    pub fn credit_type(&self) -> CreditType {
        CreditType::from_str(&self.type_).unwrap_or(CreditType::PayPerUse)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = credit_balances)]
pub struct InsertCreditBalanceEntity {
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub balance_seconds: i32,
    pub original_balance_seconds: i32,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub type_: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
