//! Stateless input validation rules.
//!
//! # Responsibility
//! - Check presentation-supplied values before any storage access.
//! - Return the normalized (trimmed) value on success.
//!
//! # Invariants
//! - Rules are pure: no I/O, no clock, no repository calls.
//! - Every failure maps to one `ValidationError` variant with a stable message.

use crate::model::recurrence::{RecurrenceError, RecurrenceRule};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 20;
pub const TASK_TITLE_MAX_CHARS: usize = 200;
pub const TASK_DESCRIPTION_MAX_CHARS: usize = 2000;
pub const CATEGORY_NAME_MAX_CHARS: usize = 50;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});
static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid color regex"));

/// A single rejected input value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UsernameLength { actual: usize },
    UsernameCharset,
    InvalidEmail,
    BlankFullName,
    /// Identifier supplied for `field` is zero or negative.
    NonPositiveId { field: &'static str, value: i64 },
    BlankTitle,
    TitleTooLong { actual: usize },
    DescriptionTooLong { actual: usize },
    BlankCategoryName,
    CategoryNameTooLong { actual: usize },
    InvalidColor(String),
    BlankTag,
    /// Logged work must be at least one minute.
    NonPositiveMinutes,
    InvalidRecurrence(RecurrenceError),
    /// Operation needs a recurrence root but got a plain task or an instance.
    NotRecurrenceRoot { task_id: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameLength { actual } => write!(
                f,
                "username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters, got {actual}"
            ),
            Self::UsernameCharset => write!(
                f,
                "username may only contain letters, digits, `_`, `.` and `-`"
            ),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::BlankFullName => write!(f, "full name must not be empty"),
            Self::NonPositiveId { field, value } => {
                write!(f, "{field} must be a positive id, got {value}")
            }
            Self::BlankTitle => write!(f, "task title must not be empty"),
            Self::TitleTooLong { actual } => write!(
                f,
                "task title must be at most {TASK_TITLE_MAX_CHARS} characters, got {actual}"
            ),
            Self::DescriptionTooLong { actual } => write!(
                f,
                "task description must be at most {TASK_DESCRIPTION_MAX_CHARS} characters, got {actual}"
            ),
            Self::BlankCategoryName => write!(f, "category name must not be empty"),
            Self::CategoryNameTooLong { actual } => write!(
                f,
                "category name must be at most {CATEGORY_NAME_MAX_CHARS} characters, got {actual}"
            ),
            Self::InvalidColor(value) => {
                write!(f, "color `{value}` must use the #RRGGBB format")
            }
            Self::BlankTag => write!(f, "tag must not be empty"),
            Self::NonPositiveMinutes => write!(f, "logged minutes must be greater than zero"),
            Self::InvalidRecurrence(err) => write!(f, "{err}"),
            Self::NotRecurrenceRoot { task_id } => {
                write!(f, "task {task_id} is not a recurring template")
            }
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRecurrence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecurrenceError> for ValidationError {
    fn from(value: RecurrenceError) -> Self {
        Self::InvalidRecurrence(value)
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Username: 3 to 20 characters of `[A-Za-z0-9_.-]` after trim.
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let trimmed = username.trim();
    let actual = trimmed.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&actual) {
        return Err(ValidationError::UsernameLength { actual });
    }
    if !USERNAME_RE.is_match(trimmed) {
        return Err(ValidationError::UsernameCharset);
    }
    Ok(trimmed.to_string())
}

/// Email: `local@domain.tld` shape.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let trimmed = email.trim();
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(trimmed.to_string())
}

pub fn validate_full_name(full_name: &str) -> ValidationResult<String> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankFullName);
    }
    Ok(trimmed.to_string())
}

/// Ids coming from the presentation layer must be strictly positive.
pub fn validate_id(field: &'static str, value: i64) -> ValidationResult<i64> {
    if value <= 0 {
        return Err(ValidationError::NonPositiveId { field, value });
    }
    Ok(value)
}

pub fn validate_task_title(title: &str) -> ValidationResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    let actual = trimmed.chars().count();
    if actual > TASK_TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong { actual });
    }
    Ok(trimmed.to_string())
}

/// Descriptions may be empty; only the length is bounded.
pub fn validate_description(description: &str) -> ValidationResult<String> {
    let trimmed = description.trim();
    let actual = trimmed.chars().count();
    if actual > TASK_DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::DescriptionTooLong { actual });
    }
    Ok(trimmed.to_string())
}

pub fn validate_category_name(name: &str) -> ValidationResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankCategoryName);
    }
    let actual = trimmed.chars().count();
    if actual > CATEGORY_NAME_MAX_CHARS {
        return Err(ValidationError::CategoryNameTooLong { actual });
    }
    Ok(trimmed.to_string())
}

/// Optional `#RRGGBB` color, uppercased. Blank input means "no color".
pub fn validate_color(color: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(raw) = color.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if !COLOR_RE.is_match(raw) {
        return Err(ValidationError::InvalidColor(raw.to_string()));
    }
    Ok(Some(raw.to_ascii_uppercase()))
}

pub fn validate_tag(tag: &str) -> ValidationResult<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankTag);
    }
    Ok(trimmed.to_string())
}

pub fn validate_logged_minutes(minutes: u32) -> ValidationResult<u32> {
    if minutes == 0 {
        return Err(ValidationError::NonPositiveMinutes);
    }
    Ok(minutes)
}

/// Parses a recurrence rule and returns its canonical string form.
pub fn validate_recurrence_rule(rule: &str) -> ValidationResult<String> {
    let parsed: RecurrenceRule = rule.parse()?;
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_length_bounds_are_inclusive() {
        assert_eq!(
            validate_username("ab"),
            Err(ValidationError::UsernameLength { actual: 2 })
        );
        assert_eq!(validate_username("abc").as_deref(), Ok("abc"));
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert_eq!(
            validate_username(&"a".repeat(21)),
            Err(ValidationError::UsernameLength { actual: 21 })
        );
        assert_eq!(
            validate_username(""),
            Err(ValidationError::UsernameLength { actual: 0 })
        );
    }

    #[test]
    fn username_rejects_spaces_and_symbols() {
        assert_eq!(
            validate_username("john doe"),
            Err(ValidationError::UsernameCharset)
        );
        assert_eq!(
            validate_username("john@doe"),
            Err(ValidationError::UsernameCharset)
        );
        assert_eq!(validate_username("  j.doe-1_x ").as_deref(), Ok("j.doe-1_x"));
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.org").is_ok());
        for bad in ["", "plainaddress", "@example.com", "user@", "user@localhost", "a b@c.de"] {
            assert_eq!(validate_email(bad), Err(ValidationError::InvalidEmail), "{bad}");
        }
    }

    #[test]
    fn full_name_must_not_be_blank() {
        assert_eq!(validate_full_name("   "), Err(ValidationError::BlankFullName));
        assert_eq!(validate_full_name(" Test User ").as_deref(), Ok("Test User"));
    }

    #[test]
    fn ids_must_be_positive() {
        assert_eq!(validate_id("user_id", 1), Ok(1));
        let err = validate_id("user_id", 0).unwrap_err();
        assert_eq!(err.to_string(), "user_id must be a positive id, got 0");
        assert!(validate_id("task_id", -4).is_err());
    }

    #[test]
    fn color_is_optional_and_normalized() {
        assert_eq!(validate_color(None), Ok(None));
        assert_eq!(validate_color(Some("  ")), Ok(None));
        assert_eq!(validate_color(Some("#a1b2c3")), Ok(Some("#A1B2C3".to_string())));
        assert!(matches!(
            validate_color(Some("red")),
            Err(ValidationError::InvalidColor(_))
        ));
    }

    #[test]
    fn recurrence_rule_is_canonicalized() {
        assert_eq!(
            validate_recurrence_rule("weekly").as_deref(),
            Ok("FREQ=WEEKLY")
        );
        assert!(matches!(
            validate_recurrence_rule("sometimes"),
            Err(ValidationError::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn title_and_minutes() {
        assert_eq!(validate_task_title("  "), Err(ValidationError::BlankTitle));
        assert!(matches!(
            validate_task_title(&"x".repeat(201)),
            Err(ValidationError::TitleTooLong { actual: 201 })
        ));
        assert_eq!(validate_logged_minutes(0), Err(ValidationError::NonPositiveMinutes));
        assert_eq!(validate_logged_minutes(15), Ok(15));
    }
}
