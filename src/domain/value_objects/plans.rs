use serde::Serialize;

use crate::domain::{entities::plans::PlanEntity, value_objects::enums::plan_types::PlanType};

/// Catalog id of the plan every new account is enrolled in.
pub const FREE_PLAN_ID: &str = "free";
/// Free grant handed out at registration (two minutes).
pub const FREE_GRANT_SECONDS: i32 = 120;
pub const FREE_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub plan_type: Option<PlanType>,
    pub price_cents: i32,
    pub minutes_included: Option<i32>,
    pub billing_cycle: String,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            plan_type: PlanType::from_str(&value.type_),
            id: value.id,
            name: value.name,
            price_cents: value.price_cents,
            minutes_included: value.minutes_included,
            billing_cycle: value.billing_cycle,
        }
    }
}
