use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Free,
    PayPerUse,
    Monthly,
    Annual,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Free => "free",
            PlanType::PayPerUse => "payperuse",
            PlanType::Monthly => "monthly",
            PlanType::Annual => "annual",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "free" => Some(PlanType::Free),
            "payperuse" => Some(PlanType::PayPerUse),
            "monthly" => Some(PlanType::Monthly),
            "annual" => Some(PlanType::Annual),
            _ => None,
        }
    }
}

impl Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
