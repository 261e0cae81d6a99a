//! Domain model for users, tasks and their classification.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Provide derived display values for presentation callers.
//!
//! # Invariants
//! - Identifiers are assigned by storage and are strictly positive.
//! - Entities are mutated only through their lifecycle methods.

use chrono::{Local, NaiveDate, NaiveDateTime};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category;
pub mod priority;
pub mod recurrence;
pub mod status;
pub mod task;
pub mod user;

/// Storage-assigned user identifier.
pub type UserId = i64;
/// Storage-assigned task identifier.
pub type TaskId = i64;
/// Storage-assigned category identifier.
pub type CategoryId = i64;

/// Error returned when a string does not name any variant of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    /// Human-readable enum name, e.g. `priority`.
    pub target: &'static str,
    /// Original input.
    pub input: String,
}

impl Display for ParseEnumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} `{}`", self.target, self.input)
    }
}

impl Error for ParseEnumError {}

/// Wall-clock reading used for entity timestamps.
pub(crate) fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Folds user input into the lookup key shared by all enum parsers.
///
/// `" In-Progress "` and `"IN_PROGRESS"` both become `in_progress`.
pub(crate) fn enum_lookup_key(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|ch| match ch {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
