pub mod credit_types;
pub mod plan_types;
pub mod session_statuses;
pub mod subscription_statuses;
pub mod user_statuses;
