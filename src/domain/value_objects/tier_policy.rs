use serde::Serialize;

use crate::domain::{
    entities::credit_balances::CreditBalanceEntity,
    value_objects::enums::credit_types::CreditType,
};

/// Hard wall-clock ceiling for free-tier sessions.
pub const FREE_TIER_CAP_SECONDS: i32 = 90;
/// Share of a recurring grant that must be used before the grace annotation appears.
pub const GRACE_THRESHOLD_PERCENT: i64 = 90;
pub const GRACE_ALLOWANCE_SECONDS: i32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDecision {
    pub should_stop: bool,
    pub grace_period: bool,
    pub grace_seconds_remaining: i32,
    /// Seconds that count against the ledger for this session in total.
    pub billable_seconds: i32,
    /// Part of `billable_seconds` not yet charged; never negative.
    pub charge_seconds: i32,
    /// Balance left once `charge_seconds` is charged, never negative.
    pub remaining_seconds: i32,
}

/// Elapsed time that may be billed and recorded for a session of the given tier.
pub fn billable_seconds(credit_type: CreditType, elapsed_seconds: i32) -> i32 {
    let elapsed_seconds = elapsed_seconds.max(0);
    match credit_type {
        CreditType::Free => elapsed_seconds.min(FREE_TIER_CAP_SECONDS),
        _ => elapsed_seconds,
    }
}

/// Rules in order: free-tier cutoff, balance exhaustion, recurring-plan grace, continue.
///
/// `balance` already reflects what this session was charged so far (`billed_seconds`),
/// so only the difference is projected against it.
pub fn evaluate(
    balance: &CreditBalanceEntity,
    elapsed_seconds: i32,
    billed_seconds: i32,
) -> TierDecision {
    let credit_type = balance.credit_type();
    let billable = billable_seconds(credit_type, elapsed_seconds);
    let charge = (billable - billed_seconds.max(0)).max(0);
    let remaining = (balance.balance_seconds - charge).max(0);

    let mut decision = TierDecision {
        should_stop: false,
        grace_period: false,
        grace_seconds_remaining: 0,
        billable_seconds: billable,
        charge_seconds: charge,
        remaining_seconds: remaining,
    };

    if credit_type == CreditType::Free && elapsed_seconds >= FREE_TIER_CAP_SECONDS {
        decision.should_stop = true;
        return decision;
    }

    if remaining <= 0 {
        decision.should_stop = true;
        return decision;
    }

    if credit_type.is_recurring() && has_reached_grace_threshold(balance, remaining) {
        decision.grace_period = true;
        decision.grace_seconds_remaining = GRACE_ALLOWANCE_SECONDS;
    }

    decision
}

fn has_reached_grace_threshold(balance: &CreditBalanceEntity, remaining: i32) -> bool {
    let original = i64::from(balance.original_balance_seconds);
    if original <= 0 {
        return false;
    }
    let used = original - i64::from(remaining);
    used * 100 >= original * GRACE_THRESHOLD_PERCENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn balance(credit_type: CreditType, balance_seconds: i32, original: i32) -> CreditBalanceEntity {
        let now = Utc::now();
        CreditBalanceEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            subscription_id: None,
            balance_seconds,
            original_balance_seconds: original,
            period_start: now - Duration::days(1),
            period_end: now + Duration::days(29),
            type_: credit_type.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn free_tier_stops_at_cap_and_bills_exactly_the_cap() {
        let decision = evaluate(&balance(CreditType::Free, 120, 120), 95, 0);

        assert!(decision.should_stop);
        assert_eq!(decision.billable_seconds, 90);
        assert_eq!(decision.remaining_seconds, 30);
        assert!(!decision.grace_period);
    }

    #[test]
    fn free_tier_continues_below_cap() {
        let decision = evaluate(&balance(CreditType::Free, 120, 120), 89, 0);

        assert!(!decision.should_stop);
        assert_eq!(decision.remaining_seconds, 31);
    }

    #[test]
    fn pay_per_use_stops_when_projection_is_exhausted() {
        let decision = evaluate(&balance(CreditType::PayPerUse, 20, 600), 25, 0);

        assert!(decision.should_stop);
        assert_eq!(decision.remaining_seconds, 0);
        assert_eq!(decision.billable_seconds, 25);
    }

    #[test]
    fn monthly_near_exhaustion_gets_grace_without_stopping() {
        let decision = evaluate(&balance(CreditType::Monthly, 50, 600), 0, 0);

        assert!(!decision.should_stop);
        assert!(decision.grace_period);
        assert_eq!(decision.grace_seconds_remaining, GRACE_ALLOWANCE_SECONDS);
        assert_eq!(decision.remaining_seconds, 50);
    }

    #[test]
    fn annual_below_threshold_has_no_grace() {
        let decision = evaluate(&balance(CreditType::Annual, 3000, 6000), 60, 0);

        assert!(!decision.should_stop);
        assert!(!decision.grace_period);
        assert_eq!(decision.grace_seconds_remaining, 0);
    }

    #[test]
    fn grace_counts_the_elapsed_projection() {
        // 100 of 600 left is 83% used; 45 more seconds crosses 90%.
        assert!(!evaluate(&balance(CreditType::Monthly, 100, 600), 0, 0).grace_period);
        assert!(evaluate(&balance(CreditType::Monthly, 100, 600), 45, 0).grace_period);
    }

    #[test]
    fn pay_per_use_never_enters_grace() {
        let decision = evaluate(&balance(CreditType::PayPerUse, 10, 600), 1, 0);

        assert!(!decision.should_stop);
        assert!(!decision.grace_period);
    }

    #[test]
    fn exhausted_recurring_plan_stops_instead_of_grace() {
        let decision = evaluate(&balance(CreditType::Monthly, 50, 600), 50, 0);

        assert!(decision.should_stop);
        assert!(!decision.grace_period);
    }

    #[test]
    fn only_the_unbilled_part_is_projected() {
        // 40 of this session's 100 seconds were already taken off the 80 left.
        let decision = evaluate(&balance(CreditType::PayPerUse, 80, 600), 100, 40);

        assert_eq!(decision.billable_seconds, 100);
        assert_eq!(decision.charge_seconds, 60);
        assert_eq!(decision.remaining_seconds, 20);
        assert!(!decision.should_stop);
    }

    #[test]
    fn lower_report_than_already_billed_charges_nothing() {
        let decision = evaluate(&balance(CreditType::PayPerUse, 80, 600), 30, 40);

        assert_eq!(decision.billable_seconds, 30);
        assert_eq!(decision.charge_seconds, 0);
        assert_eq!(decision.remaining_seconds, 80);
    }

    #[test]
    fn negative_elapsed_bills_nothing() {
        assert_eq!(billable_seconds(CreditType::PayPerUse, -5), 0);
        assert_eq!(billable_seconds(CreditType::Free, 500), FREE_TIER_CAP_SECONDS);
    }
}
