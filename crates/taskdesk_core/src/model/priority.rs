//! Task priority levels.

use super::{enum_lookup_key, ParseEnumError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Urgency of a task, ordered from least to most urgent.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// All variants, least urgent first.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Numeric level, 1 (low) through 4 (urgent).
    pub fn level(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }

    /// Label shown to users.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }

    /// Stable code persisted in storage.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Resolves a numeric level back to a priority.
    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|priority| priority.level() == level)
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    /// Accepts display names, storage codes and numeric levels.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match enum_lookup_key(value).as_str() {
            "low" | "1" => Ok(Self::Low),
            "medium" | "normal" | "2" => Ok(Self::Medium),
            "high" | "3" => Ok(Self::High),
            "urgent" | "critical" | "4" => Ok(Self::Urgent),
            _ => Err(ParseEnumError {
                target: "priority",
                input: value.to_string(),
            }),
        }
    }
}
