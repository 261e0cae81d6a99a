//! Recurrence rules for repeating tasks.
//!
//! # Responsibility
//! - Parse the stored rule string (`FREQ=WEEKLY;INTERVAL=2` subset of RRULE).
//! - Compute the next due date for a generated task instance.
//!
//! # Invariants
//! - `interval` is always >= 1.
//! - Month/year steps clamp to the last day of the target month.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const MAX_INTERVAL: u32 = 999;

/// Repetition unit of a recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn as_rule_token(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    fn parse_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "YEARLY" | "ANNUALLY" => Some(Self::Yearly),
            _ => None,
        }
    }

    fn unit_name(self) -> &'static str {
        match self {
            Self::Daily => "day",
            Self::Weekly => "week",
            Self::Monthly => "month",
            Self::Yearly => "year",
        }
    }
}

/// Reasons a recurrence rule string is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    /// Rule is empty after trim.
    Empty,
    /// No `FREQ` part was supplied.
    MissingFrequency,
    UnknownFrequency(String),
    /// `INTERVAL` is not an integer in `1..=999`.
    InvalidInterval(String),
    /// A `KEY=VALUE` part outside the supported subset.
    UnsupportedPart(String),
}

impl Display for RecurrenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "recurrence rule must not be empty"),
            Self::MissingFrequency => write!(f, "recurrence rule is missing FREQ"),
            Self::UnknownFrequency(value) => {
                write!(f, "unknown recurrence frequency `{value}`")
            }
            Self::InvalidInterval(value) => write!(
                f,
                "recurrence interval `{value}` must be an integer between 1 and {MAX_INTERVAL}"
            ),
            Self::UnsupportedPart(value) => {
                write!(f, "unsupported recurrence rule part `{value}`")
            }
        }
    }
}

impl Error for RecurrenceError {}

/// Parsed recurrence rule.
///
/// Serialized as its canonical rule string, so every deserialized value has
/// passed the same checks as [`RecurrenceRule::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecurrenceRule {
    frequency: Frequency,
    interval: u32,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency, interval: u32) -> Result<Self, RecurrenceError> {
        if interval == 0 || interval > MAX_INTERVAL {
            return Err(RecurrenceError::InvalidInterval(interval.to_string()));
        }
        Ok(Self {
            frequency,
            interval,
        })
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Returns the date one rule step after `from`.
    ///
    /// Returns `None` only when the result would leave chrono's date range.
    pub fn next_after(&self, from: NaiveDate) -> Option<NaiveDate> {
        match self.frequency {
            Frequency::Daily => from.checked_add_days(Days::new(u64::from(self.interval))),
            Frequency::Weekly => from.checked_add_days(Days::new(7 * u64::from(self.interval))),
            Frequency::Monthly => from.checked_add_months(Months::new(self.interval)),
            Frequency::Yearly => self
                .interval
                .checked_mul(12)
                .and_then(|months| from.checked_add_months(Months::new(months))),
        }
    }

    /// Human-readable summary, e.g. `Every 2 weeks`.
    pub fn description(&self) -> String {
        match (self.frequency, self.interval) {
            (Frequency::Daily, 1) => "Daily".to_string(),
            (Frequency::Weekly, 1) => "Weekly".to_string(),
            (Frequency::Monthly, 1) => "Monthly".to_string(),
            (Frequency::Yearly, 1) => "Yearly".to_string(),
            (frequency, interval) => format!("Every {interval} {}s", frequency.unit_name()),
        }
    }
}

impl Display for RecurrenceRule {
    /// Canonical rule string as persisted on tasks.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FREQ={}", self.frequency.as_rule_token())?;
        if self.interval != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        Ok(())
    }
}

impl FromStr for RecurrenceRule {
    type Err = RecurrenceError;

    /// Accepts `FREQ=<unit>[;INTERVAL=<n>]` or a bare unit such as `weekly`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(RecurrenceError::Empty);
        }

        if !trimmed.contains('=') {
            let frequency = Frequency::parse_token(trimmed)
                .ok_or_else(|| RecurrenceError::UnknownFrequency(trimmed.to_string()))?;
            return Self::new(frequency, 1);
        }

        let mut frequency = None;
        let mut interval = 1;
        for part in trimmed.split(';').map(str::trim).filter(|part| !part.is_empty()) {
            let (key, raw) = part
                .split_once('=')
                .ok_or_else(|| RecurrenceError::UnsupportedPart(part.to_string()))?;
            match key.trim().to_ascii_uppercase().as_str() {
                "FREQ" => {
                    frequency = Some(
                        Frequency::parse_token(raw)
                            .ok_or_else(|| RecurrenceError::UnknownFrequency(raw.to_string()))?,
                    );
                }
                "INTERVAL" => {
                    interval = raw
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| RecurrenceError::InvalidInterval(raw.to_string()))?;
                }
                _ => return Err(RecurrenceError::UnsupportedPart(part.to_string())),
            }
        }

        let frequency = frequency.ok_or(RecurrenceError::MissingFrequency)?;
        Self::new(frequency, interval)
    }
}

impl TryFrom<String> for RecurrenceRule {
    type Error = RecurrenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecurrenceRule> for String {
    fn from(rule: RecurrenceRule) -> Self {
        rule.to_string()
    }
}
