use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::plan_types::PlanType;

/// Provenance of a credit grant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CreditType {
    Free,
    PayPerUse,
    Monthly,
    Annual,
    Grace,
}

impl CreditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditType::Free => "free",
            CreditType::PayPerUse => "payperuse",
            CreditType::Monthly => "monthly",
            CreditType::Annual => "annual",
            CreditType::Grace => "grace",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "free" => Some(CreditType::Free),
            "payperuse" => Some(CreditType::PayPerUse),
            "monthly" => Some(CreditType::Monthly),
            "annual" => Some(CreditType::Annual),
            "grace" => Some(CreditType::Grace),
            _ => None,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, CreditType::Monthly | CreditType::Annual)
    }
}

impl Display for CreditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PlanType> for CreditType {
    fn from(value: PlanType) -> Self {
        match value {
            PlanType::Free => CreditType::Free,
            PlanType::PayPerUse => CreditType::PayPerUse,
            PlanType::Monthly => CreditType::Monthly,
            PlanType::Annual => CreditType::Annual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_names_round_trip() {
        for credit_type in [
            CreditType::Free,
            CreditType::PayPerUse,
            CreditType::Monthly,
            CreditType::Annual,
            CreditType::Grace,
        ] {
            assert_eq!(CreditType::from_str(credit_type.as_str()), Some(credit_type));
        }
        assert_eq!(CreditType::from_str("pay_per_use"), None);
    }

    #[test]
    fn serializes_like_storage() {
        let json = serde_json::to_string(&CreditType::PayPerUse).unwrap();
        assert_eq!(json, "\"payperuse\"");
    }

    #[test]
    fn only_monthly_and_annual_recur() {
        assert!(CreditType::Monthly.is_recurring());
        assert!(CreditType::Annual.is_recurring());
        assert!(!CreditType::Free.is_recurring());
        assert!(!CreditType::PayPerUse.is_recurring());
        assert!(!CreditType::Grace.is_recurring());
    }
}
