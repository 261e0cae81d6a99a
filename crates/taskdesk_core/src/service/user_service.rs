//! User use-case service.
//!
//! # Responsibility
//! - Register users after format and uniqueness checks.
//! - Provide lookups and profile maintenance.
//!
//! # Invariants
//! - Format rules run in order username, email, full name; the first failure
//!   short-circuits every later check and every repository call.
//! - Username uniqueness is checked before email uniqueness.

use super::{report, Conflict, ConflictField, ServiceError, ServiceResult};
use crate::model::local_now;
use crate::model::user::{NewUser, User};
use crate::repo::user_repo::UserRepository;
use crate::validation::{validate_email, validate_full_name, validate_id, validate_username};
use log::info;

/// User service facade over a persistence port.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a regular user.
    ///
    /// # Errors
    /// - `InvalidInput` when a format rule fails (no repository access).
    /// - `Conflict` when the username or email is already registered.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
    ) -> ServiceResult<User> {
        report(
            "user_create",
            self.register(username, email, full_name, false),
        )
    }

    /// Registers a user with administrative privileges.
    pub fn create_admin_user(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
    ) -> ServiceResult<User> {
        report(
            "user_create",
            self.register(username, email, full_name, true),
        )
    }

    /// Looks a user up by id. Absence is `Ok(None)`.
    ///
    /// Non-positive ids are rejected before the repository is queried.
    pub fn find_user_by_id(&self, id: i64) -> ServiceResult<Option<User>> {
        report("user_find", self.find_by_id_inner(id))
    }

    pub fn find_user_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        report("user_find", self.find_by_username_inner(username))
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        report("user_list", self.repo.list_users().map_err(Into::into))
    }

    /// Replaces full name and email of an existing user.
    ///
    /// Keeping the current email (any casing) never conflicts with itself.
    pub fn update_profile(
        &self,
        id: i64,
        full_name: &str,
        email: &str,
    ) -> ServiceResult<User> {
        report("user_update", self.update_profile_inner(id, full_name, email))
    }

    pub fn set_admin(&self, id: i64, is_admin: bool) -> ServiceResult<User> {
        report("user_set_admin", self.set_admin_inner(id, is_admin))
    }

    fn register(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
        is_admin: bool,
    ) -> ServiceResult<User> {
        let username = validate_username(username)?;
        let email = validate_email(email)?;
        let full_name = validate_full_name(full_name)?;

        if self.repo.username_exists(&username)? {
            return Err(Conflict::new(ConflictField::Username, username).into());
        }
        if self.repo.email_exists(&email)? {
            return Err(Conflict::new(ConflictField::Email, email).into());
        }

        let user = self.repo.create_user(&NewUser {
            username,
            email,
            full_name,
            is_admin,
        })?;
        info!(
            "event=user_create module=service status=ok user_id={} is_admin={}",
            user.id(),
            user.is_admin()
        );
        Ok(user)
    }

    fn find_by_id_inner(&self, id: i64) -> ServiceResult<Option<User>> {
        let id = validate_id("user_id", id)?;
        Ok(self.repo.find_by_id(id)?)
    }

    fn find_by_username_inner(&self, username: &str) -> ServiceResult<Option<User>> {
        let username = validate_username(username)?;
        Ok(self.repo.find_by_username(&username)?)
    }

    fn load(&self, id: i64) -> ServiceResult<User> {
        let id = validate_id("user_id", id)?;
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| ServiceError::not_found("user", id))
    }

    fn update_profile_inner(&self, id: i64, full_name: &str, email: &str) -> ServiceResult<User> {
        validate_id("user_id", id)?;
        let full_name = validate_full_name(full_name)?;
        let email = validate_email(email)?;

        let mut user = self.load(id)?;
        if !user.email().eq_ignore_ascii_case(&email) && self.repo.email_exists(&email)? {
            return Err(Conflict::new(ConflictField::Email, email).into());
        }

        user.update_profile(full_name, email, local_now());
        self.repo.update_user(&user)?;
        info!(
            "event=user_update module=service status=ok user_id={}",
            user.id()
        );
        Ok(user)
    }

    fn set_admin_inner(&self, id: i64, is_admin: bool) -> ServiceResult<User> {
        let mut user = self.load(id)?;
        if user.is_admin() == is_admin {
            return Ok(user);
        }
        user.set_admin(is_admin, local_now());
        self.repo.update_user(&user)?;
        info!(
            "event=user_set_admin module=service status=ok user_id={} is_admin={is_admin}",
            user.id()
        );
        Ok(user)
    }
}
