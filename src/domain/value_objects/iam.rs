use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{
        credit_balances::InsertCreditBalanceEntity,
        subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        users::{RegisterUserEntity, UserEntity},
    },
    value_objects::{
        enums::{subscription_statuses::SubscriptionStatus, user_statuses::UserStatus},
        metering::BalanceDto,
    },
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserModel {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

impl RegisterUserModel {
    pub fn to_entity(&self, id: Uuid, password_hash: String) -> RegisterUserEntity {
        RegisterUserEntity {
            id,
            email: self.email.trim().to_string(),
            password_hash,
            name: self
                .name
                .as_ref()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            email_verified: false,
            status: UserStatus::Active.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Rows a new account is created with. They are written together or not at all.
#[derive(Debug, Clone)]
pub struct AccountEnrollment {
    pub user: RegisterUserEntity,
    pub subscription: InsertSubscriptionEntity,
    pub free_grant: InsertCreditBalanceEntity,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginModel {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
    pub status: UserStatus,
    pub created_at: i64,
}

impl From<UserEntity> for UserDto {
    fn from(value: UserEntity) -> Self {
        let status = UserStatus::from_str(&value.status);
        Self {
            id: value.id,
            email: value.email,
            name: value.name,
            email_verified: value.email_verified,
            status,
            created_at: value.created_at.timestamp(),
        }
    }
}

/// Body returned by register and login; the same token is also set as a cookie.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSessionDto {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub plan_id: String,
    pub status: SubscriptionStatus,
    pub current_period_start: i64,
    pub current_period_end: i64,
    pub cancel_at_period_end: bool,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(value: SubscriptionEntity) -> Self {
        Self {
            id: value.id,
            plan_id: value.plan_id,
            status: SubscriptionStatus::from_str(&value.status),
            current_period_start: value.current_period_start.timestamp(),
            current_period_end: value.current_period_end.timestamp(),
            cancel_at_period_end: value.cancel_at_period_end,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeDto {
    pub user: UserDto,
    pub subscription: Option<SubscriptionDto>,
    pub balance: BalanceDto,
}
