//! Core domain logic for Taskdesk.
//! This crate is the single source of truth for task, user and category
//! invariants; presentation layers call the services and never touch storage.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::CoreConfig;
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, NewCategory};
pub use model::priority::Priority;
pub use model::recurrence::{Frequency, RecurrenceError, RecurrenceRule};
pub use model::status::TaskStatus;
pub use model::task::{format_minutes, NewTask, Task, TaskRecord, TaskValidationError};
pub use model::user::{NewUser, User, UserRecord};
pub use model::{CategoryId, ParseEnumError, TaskId, UserId};
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::category_service::CategoryService;
pub use service::task_service::{CreateTaskRequest, TaskService, TaskUpdate};
pub use service::user_service::UserService;
pub use service::{Conflict, ConflictField, ErrorKind, ServiceError, ServiceResult};
pub use validation::ValidationError;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
