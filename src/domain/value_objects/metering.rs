use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{credit_balances::CreditBalanceEntity, usage_logs::UsageLogEntity},
    value_objects::enums::{credit_types::CreditType, session_statuses::SessionStatus},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StartSessionRequest {
    pub scenario_id: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub available_seconds: i32,
    pub credit_type: CreditType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeartbeatRequest {
    pub session_id: Uuid,
    pub elapsed_seconds: i32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub should_stop: bool,
    pub available_seconds: i32,
    pub grace_period: bool,
    pub grace_seconds_remaining: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EndSessionRequest {
    pub session_id: Uuid,
    pub elapsed_seconds: i32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionResponse {
    pub seconds_used: i32,
    pub remaining_seconds: i32,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDto {
    pub balance_seconds: i32,
    pub original_seconds: i32,
    #[serde(rename = "type")]
    pub credit_type: Option<CreditType>,
    /// Unix seconds.
    pub period_end: Option<i64>,
}

impl BalanceDto {
    pub fn zero() -> Self {
        Self {
            balance_seconds: 0,
            original_seconds: 0,
            credit_type: None,
            period_end: None,
        }
    }
}

impl From<CreditBalanceEntity> for BalanceDto {
    fn from(value: CreditBalanceEntity) -> Self {
        Self {
            balance_seconds: value.balance_seconds,
            original_seconds: value.original_balance_seconds,
            credit_type: Some(value.credit_type()),
            period_end: Some(value.period_end.timestamp()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UsageHistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummaryDto {
    pub session_id: Uuid,
    pub scenario_id: Option<String>,
    pub session_start: i64,
    pub session_end: Option<i64>,
    pub duration_seconds: i32,
    pub status: SessionStatus,
}

impl From<UsageLogEntity> for UsageSummaryDto {
    fn from(value: UsageLogEntity) -> Self {
        let status = value.session_status();
        Self {
            session_id: value.id,
            scenario_id: value.scenario_id,
            session_start: value.session_start.timestamp(),
            session_end: value.session_end.map(|end| end.timestamp()),
            duration_seconds: value.duration_seconds,
            status,
        }
    }
}

/// One accounting step for an `active` session, applied atomically by the usage log
/// repository. `billable_seconds` overwrites the recorded duration, its unbilled part is
/// taken off `balance_id`, and the log is completed when `finalize` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCharge {
    pub session_id: Uuid,
    pub balance_id: Option<Uuid>,
    pub billable_seconds: i32,
    pub finalize: bool,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionChargeOutcome {
    pub usage_log: UsageLogEntity,
    /// The charged balance after the deduction, if one was given and still exists.
    pub balance: Option<CreditBalanceEntity>,
    pub charged_seconds: i32,
}

impl SessionChargeOutcome {
    pub fn remaining_seconds(&self) -> i32 {
        self.balance
            .as_ref()
            .map(|balance| balance.balance_seconds)
            .unwrap_or(0)
    }
}
