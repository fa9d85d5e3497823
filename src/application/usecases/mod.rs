pub mod authentication;
pub mod credit_ledger;
pub mod plans;
pub mod session_accounting;
