use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// `Active -> Completed`; completed is terminal.
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        };
        write!(f, "{}", status)
    }
}

impl SessionStatus {
    // Unknown values are treated as terminal so they are never mutated.
    pub fn from_str(value: &str) -> Self {
        match value {
            "active" => SessionStatus::Active,
            _ => SessionStatus::Completed,
        }
    }
}
