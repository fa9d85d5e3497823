use diesel::prelude::*;

use crate::infrastructure::postgres::schema::subscription_plans;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plans)]
pub struct PlanEntity {
    pub id: String,
    pub name: String,
    pub type_: String,
    pub price_cents: i32,
    pub minutes_included: Option<i32>,
    pub billing_cycle: String,
    pub active: bool,
}
