pub mod authentication;
pub mod plans;
pub mod usage;
