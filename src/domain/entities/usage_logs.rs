use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::session_statuses::SessionStatus,
    infrastructure::postgres::schema::usage_logs,
};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = usage_logs)]
pub struct UsageLogEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_start: DateTime<Utc>,
    pub session_end: Option<DateTime<Utc>>,
    pub duration_seconds: i32,
    /// Seconds already taken off the ledger for this session.
    pub billed_seconds: i32,
    pub scenario_id: Option<String>,
    pub subscription_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl UsageLogEntity {
    pub fn session_status(&self) -> SessionStatus {
        SessionStatus::from_str(&self.status)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = usage_logs)]
pub struct InsertUsageLogEntity {
    pub user_id: Uuid,
    pub session_start: DateTime<Utc>,
    pub duration_seconds: i32,
    pub billed_seconds: i32,
    pub scenario_id: Option<String>,
    pub subscription_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
