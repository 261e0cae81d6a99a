//! Use-case services.
//!
//! # Responsibility
//! - Validate presentation input, delegate to persistence ports, and
//!   translate their results into domain outcomes.
//! - Keep presentation layers decoupled from storage details.
//!
//! # Invariants
//! - Validation always runs before the first repository call.
//! - Lookups report absence as `Ok(None)`; mutations of a missing entity
//!   report `ServiceError::NotFound`.
//! - Log records carry ids and error kinds only, never user-entered text.

use crate::repo::RepoError;
use crate::validation::ValidationError;
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_service;
pub mod task_service;
pub mod user_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coarse outcome class callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fix the input and retry.
    InvalidInput,
    /// Pick a different unique value and retry.
    Conflict,
    /// Target entity does not exist.
    NotFound,
    /// Storage failed or returned inconsistent data.
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
        }
    }
}

/// Unique field a conflict was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Username,
    Email,
    CategoryName,
    /// Storage reported a UNIQUE violation the service could not attribute.
    Unknown,
}

impl ConflictField {
    fn label(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::CategoryName => "category name",
            Self::Unknown => "value",
        }
    }

    /// Maps a SQLite `UNIQUE constraint failed: table.column` message.
    fn from_storage_message(message: &str) -> Self {
        if message.contains("users.username") {
            Self::Username
        } else if message.contains("users.email") {
            Self::Email
        } else if message.contains("categories.name") {
            Self::CategoryName
        } else {
            Self::Unknown
        }
    }
}

/// A uniqueness constraint the operation would have violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub field: ConflictField,
    /// Offending value when known before the write.
    pub value: Option<String>,
}

impl Conflict {
    pub fn new(field: ConflictField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: Some(value.into()),
        }
    }
}

impl Display for Conflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} `{value}` is already taken", self.field.label()),
            None => write!(f, "{} is already taken", self.field.label()),
        }
    }
}

/// Rejected-operation outcome returned by every service.
#[derive(Debug)]
pub enum ServiceError {
    InvalidInput(ValidationError),
    Conflict(Conflict),
    NotFound { entity: &'static str, id: i64 },
    Repo(RepoError),
    /// Write succeeded but the read-back did not match.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Repo(_) | Self::InconsistentState(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::Conflict(conflict) => write!(f, "{conflict}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::UniqueViolation(message) => Self::Conflict(Conflict {
                field: ConflictField::from_storage_message(&message),
                value: None,
            }),
            other => Self::Repo(other),
        }
    }
}

impl From<Conflict> for ServiceError {
    fn from(value: Conflict) -> Self {
        Self::Conflict(value)
    }
}

/// Logs a rejected operation and passes the result through.
pub(crate) fn report<T>(event: &'static str, result: ServiceResult<T>) -> ServiceResult<T> {
    if let Err(err) = &result {
        match err.kind() {
            ErrorKind::Storage => error!(
                "event={event} module=service status=error kind={} error={err}",
                err.kind().as_str()
            ),
            kind => warn!(
                "event={event} module=service status=rejected kind={}",
                kind.as_str()
            ),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{ConflictField, ErrorKind, ServiceError};
    use crate::repo::RepoError;
    use crate::validation::ValidationError;

    #[test]
    fn unique_violation_maps_to_attributed_conflict() {
        let err: ServiceError =
            RepoError::UniqueViolation("UNIQUE constraint failed: users.email".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        match err {
            ServiceError::Conflict(conflict) => assert_eq!(conflict.field, ConflictField::Email),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn repo_not_found_maps_to_not_found_kind() {
        let err: ServiceError = RepoError::NotFound {
            entity: "task",
            id: 9,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "task not found: 9");
    }

    #[test]
    fn validation_maps_to_invalid_input() {
        let err: ServiceError = ValidationError::BlankFullName.into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
