//! User persistence port and SQLite adapter.
//!
//! # Invariants
//! - `create_user` assigns the id and both timestamps.
//! - Email comparisons are case-insensitive; usernames match exactly.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::user::{NewUser, User, UserRecord};
use crate::model::{local_now, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    full_name,
    is_admin,
    created_at,
    updated_at
FROM users";

/// Storage contract consumed by `UserService`.
pub trait UserRepository {
    fn username_exists(&self, username: &str) -> RepoResult<bool>;
    fn email_exists(&self, email: &str) -> RepoResult<bool>;
    /// Stores a new user and returns it with its assigned id.
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// All users ordered by username.
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Persists mutable profile fields. Missing rows yield `NotFound`.
    fn update_user(&self, user: &User) -> RepoResult<()>;
}

impl<R: UserRepository + ?Sized> UserRepository for &R {
    fn username_exists(&self, username: &str) -> RepoResult<bool> {
        (**self).username_exists(username)
    }

    fn email_exists(&self, email: &str) -> RepoResult<bool> {
        (**self).email_exists(email)
    }

    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        (**self).create_user(user)
    }

    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        (**self).find_by_id(id)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        (**self).find_by_username(username)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        (**self).list_users()
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        (**self).update_user(user)
    }
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Wraps a migrated connection; rejects unprepared ones.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn username_exists(&self, username: &str) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1);",
            [username],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn email_exists(&self, email: &str) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 COLLATE NOCASE);",
            [email],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        let now = local_now();
        self.conn.execute(
            "INSERT INTO users (username, email, full_name, is_admin, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5);",
            params![
                user.username.as_str(),
                user.email.as_str(),
                user.full_name.as_str(),
                user.is_admin,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(user.clone().into_record(id, now).into())
    }

    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE username = ?1;"),
                [username],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY username ASC, id ASC;"))?;
        let users = stmt
            .query_map([], parse_user_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                email = ?2,
                full_name = ?3,
                is_admin = ?4,
                updated_at = ?5
             WHERE id = ?1;",
            params![
                user.id(),
                user.email(),
                user.full_name(),
                user.is_admin(),
                user.updated_at(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "user",
                id: user.id(),
            });
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(UserRecord {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        full_name: row.get("full_name")?,
        is_admin: row.get("is_admin")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    }
    .into())
}
