pub mod credit_balances;
pub mod plans;
pub mod subscriptions;
pub mod usage_logs;
pub mod users;
