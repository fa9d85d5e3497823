pub mod enums;
pub mod iam;
pub mod metering;
pub mod plans;
pub mod tier_policy;
