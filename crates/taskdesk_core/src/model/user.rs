//! User domain model.
//!
//! # Invariants
//! - `id` is assigned by storage and never changes afterwards.
//! - `username` and `email` are unique across all users (storage-enforced).

use super::UserId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Validated input for creating a user. Storage assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub is_admin: bool,
}

/// Row shape used by persistence adapters to rebuild a [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewUser {
    /// Builds the stored record for this input once storage assigned an id.
    pub fn into_record(self, id: UserId, now: NaiveDateTime) -> UserRecord {
        UserRecord {
            id,
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            is_admin: self.is_admin,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registered application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
    email: String,
    full_name: String,
    is_admin: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            full_name: record.full_name,
            is_admin: record.is_admin,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl User {
    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    /// `"<full name> (<username>)"`, used by pickers and assignee columns.
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.full_name, self.username)
    }

    pub fn role_label(&self) -> &'static str {
        if self.is_admin {
            "Administrator"
        } else {
            "User"
        }
    }

    pub(crate) fn update_profile(
        &mut self,
        full_name: String,
        email: String,
        now: NaiveDateTime,
    ) {
        self.full_name = full_name;
        self.email = email;
        self.updated_at = now;
    }

    pub(crate) fn set_admin(&mut self, is_admin: bool, now: NaiveDateTime) {
        self.is_admin = is_admin;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::{NewUser, User};
    use chrono::NaiveDate;

    fn sample() -> User {
        let now = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        NewUser {
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            is_admin: false,
        }
        .into_record(7, now)
        .into()
    }

    #[test]
    fn record_conversion_keeps_identity_and_timestamps() {
        let user = sample();
        assert_eq!(user.id(), 7);
        assert_eq!(user.created_at(), user.updated_at());
        assert_eq!(user.username(), "jdoe");
    }

    #[test]
    fn display_helpers() {
        let mut user = sample();
        assert_eq!(user.display_label(), "Jane Doe (jdoe)");
        assert_eq!(user.role_label(), "User");
        let later = user.created_at() + chrono::Duration::minutes(5);
        user.set_admin(true, later);
        assert_eq!(user.role_label(), "Administrator");
        assert_eq!(user.updated_at(), later);
    }
}
