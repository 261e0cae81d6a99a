//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its derived display values.
//! - Own the lifecycle mutations (time logging, completion, tagging).
//!
//! # Invariants
//! - `status == Completed` implies `completed_at` is set.
//! - A task with `parent_task_id` is a recurrence instance, never a root.
//! - Tags are trimmed, non-blank and unique (case-sensitive), in insertion order.
//! - Minute counters are unsigned, so never negative.

use super::category::Category;
use super::priority::Priority;
use super::recurrence::RecurrenceRule;
use super::status::TaskStatus;
use super::{local_now, local_today, CategoryId, TaskId, UserId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validated input for creating a task. Storage assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<UserId>,
    pub created_by: UserId,
    pub estimated_minutes: u32,
    pub category_id: Option<CategoryId>,
    pub tags: Vec<String>,
    pub recurrence_rule: Option<String>,
    pub parent_task_id: Option<TaskId>,
}

impl NewTask {
    /// Builds the stored record for this input once storage assigned an id.
    pub fn into_record(self, id: TaskId, now: NaiveDateTime) -> TaskRecord {
        TaskRecord {
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            assigned_to: self.assigned_to,
            estimated_minutes: self.estimated_minutes,
            category_id: self.category_id,
            tags: self.tags,
            recurrence_rule: self.recurrence_rule,
            parent_task_id: self.parent_task_id,
            ..TaskRecord::new(id, self.title, self.created_by, now)
        }
    }
}

/// Row shape used by persistence adapters to rebuild a [`Task`].
///
/// Converting into `Task` runs [`Task::validate`], so a record read back from
/// storage or a presentation payload cannot smuggle in a broken invariant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<UserId>,
    pub created_by: UserId,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub estimated_minutes: u32,
    pub actual_minutes: u32,
    pub category_id: Option<CategoryId>,
    pub category: Option<Category>,
    pub tags: Vec<String>,
    pub recurrence_rule: Option<String>,
    pub parent_task_id: Option<TaskId>,
    pub last_worked_at: Option<NaiveDateTime>,
}

impl TaskRecord {
    /// Minimal record: status `Todo`, medium priority, everything else empty.
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        created_by: UserId,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            status: TaskStatus::Todo,
            due_date: None,
            assigned_to: None,
            created_by,
            created_at: now,
            updated_at: now,
            completed_at: None,
            estimated_minutes: 0,
            actual_minutes: 0,
            category_id: None,
            category: None,
            tags: Vec::new(),
            recurrence_rule: None,
            parent_task_id: None,
            last_worked_at: None,
        }
    }
}

/// Invariant violations detected on a task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    NonPositiveId(TaskId),
    NonPositiveCreator(UserId),
    BlankTitle,
    /// Status is `Completed` but no completion time is recorded.
    MissingCompletedAt,
    /// Task lists itself as its recurrence parent.
    SelfParent(TaskId),
    /// Resolved category does not match `category_id`.
    CategoryMismatch {
        category_id: Option<CategoryId>,
        resolved_id: CategoryId,
    },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveId(id) => write!(f, "task id must be positive, got {id}"),
            Self::NonPositiveCreator(id) => {
                write!(f, "task creator id must be positive, got {id}")
            }
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::MissingCompletedAt => {
                write!(f, "completed task must record a completion time")
            }
            Self::SelfParent(id) => write!(f, "task {id} cannot be its own parent"),
            Self::CategoryMismatch {
                category_id,
                resolved_id,
            } => write!(
                f,
                "resolved category {resolved_id} does not match category_id {category_id:?}"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Unit of work tracked by the application.
///
/// Deserialization goes through [`TaskRecord`], so payloads are validated and
/// their tags normalized like stored rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    priority: Priority,
    status: TaskStatus,
    due_date: Option<NaiveDate>,
    assigned_to: Option<UserId>,
    created_by: UserId,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    completed_at: Option<NaiveDateTime>,
    estimated_minutes: u32,
    actual_minutes: u32,
    category_id: Option<CategoryId>,
    category: Option<Category>,
    tags: Vec<String>,
    recurrence_rule: Option<String>,
    parent_task_id: Option<TaskId>,
    last_worked_at: Option<NaiveDateTime>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let mut task = Self {
            id: record.id,
            title: record.title,
            description: record.description,
            priority: record.priority,
            status: record.status,
            due_date: record.due_date,
            assigned_to: record.assigned_to,
            created_by: record.created_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
            completed_at: record.completed_at,
            estimated_minutes: record.estimated_minutes,
            actual_minutes: record.actual_minutes,
            category_id: record.category_id,
            category: record.category,
            tags: Vec::with_capacity(record.tags.len()),
            recurrence_rule: record.recurrence_rule,
            parent_task_id: record.parent_task_id,
            last_worked_at: record.last_worked_at,
        };
        for tag in &record.tags {
            task.add_tag(tag);
        }
        task.validate()?;
        Ok(task)
    }
}

impl Task {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    pub fn completed_at(&self) -> Option<NaiveDateTime> {
        self.completed_at
    }

    pub fn estimated_minutes(&self) -> u32 {
        self.estimated_minutes
    }

    pub fn actual_minutes(&self) -> u32 {
        self.actual_minutes
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    /// Category resolved for display; `None` when unset or not loaded.
    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn recurrence_rule(&self) -> Option<&str> {
        self.recurrence_rule.as_deref()
    }

    pub fn parent_task_id(&self) -> Option<TaskId> {
        self.parent_task_id
    }

    pub fn last_worked_at(&self) -> Option<NaiveDateTime> {
        self.last_worked_at
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id <= 0 {
            return Err(TaskValidationError::NonPositiveId(self.id));
        }
        if self.created_by <= 0 {
            return Err(TaskValidationError::NonPositiveCreator(self.created_by));
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::BlankTitle);
        }
        if self.status.is_completed() && self.completed_at.is_none() {
            return Err(TaskValidationError::MissingCompletedAt);
        }
        if self.parent_task_id == Some(self.id) {
            return Err(TaskValidationError::SelfParent(self.id));
        }
        if let Some(category) = &self.category {
            if self.category_id != Some(category.id) {
                return Err(TaskValidationError::CategoryMismatch {
                    category_id: self.category_id,
                    resolved_id: category.id,
                });
            }
        }
        Ok(())
    }

    /// Overdue against the local current date.
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(local_today())
    }

    /// True iff a due date exists, is strictly before `today`, and the task
    /// is not completed.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => due < today && !self.status.is_completed(),
            None => false,
        }
    }

    pub fn due_date_status(&self) -> String {
        self.due_date_status_on(local_today())
    }

    /// One of `No due date`, `OVERDUE`, `DUE TODAY` or `Due: YYYY-MM-DD`.
    pub fn due_date_status_on(&self, today: NaiveDate) -> String {
        match self.due_date {
            None => "No due date".to_string(),
            Some(_) if self.is_overdue_on(today) => "OVERDUE".to_string(),
            Some(due) if due == today => "DUE TODAY".to_string(),
            Some(due) => format!("Due: {}", due.format("%Y-%m-%d")),
        }
    }

    /// Signed day distance to the due date; negative when past.
    pub fn days_until_due(&self, today: NaiveDate) -> Option<i64> {
        self.due_date.map(|due| (due - today).num_days())
    }

    pub fn estimated_time_display(&self) -> String {
        if self.estimated_minutes == 0 {
            "No estimate".to_string()
        } else {
            format_minutes(self.estimated_minutes)
        }
    }

    pub fn actual_time_display(&self) -> String {
        if self.actual_minutes == 0 {
            "No time logged".to_string()
        } else {
            format_minutes(self.actual_minutes)
        }
    }

    /// Ratio of estimated to actual minutes.
    ///
    /// `None` when either side is zero: without both an estimate and logged
    /// work there is nothing to compare.
    pub fn time_efficiency(&self) -> Option<f64> {
        if self.estimated_minutes == 0 || self.actual_minutes == 0 {
            return None;
        }
        Some(f64::from(self.estimated_minutes) / f64::from(self.actual_minutes))
    }

    /// Adds worked minutes and stamps `last_worked_at`/`updated_at`.
    pub fn add_time_worked(&mut self, minutes: u32) {
        self.add_time_worked_at(minutes, local_now());
    }

    /// Same as [`Task::add_time_worked`] with an explicit clock reading.
    /// Zero minutes leaves the task untouched.
    pub fn add_time_worked_at(&mut self, minutes: u32, now: NaiveDateTime) {
        if minutes == 0 {
            return;
        }
        self.actual_minutes = self.actual_minutes.saturating_add(minutes);
        self.last_worked_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_completed(&mut self) {
        self.mark_completed_at(local_now());
    }

    /// Sets status to `Completed` and stamps `completed_at`/`updated_at`.
    pub fn mark_completed_at(&mut self, now: NaiveDateTime) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn reopen(&mut self) -> bool {
        self.reopen_at(local_now())
    }

    /// Moves a completed task back to `Todo`. Returns `false` when the task
    /// was not completed.
    pub fn reopen_at(&mut self, now: NaiveDateTime) -> bool {
        if !self.status.is_completed() {
            return false;
        }
        self.status = TaskStatus::Todo;
        self.completed_at = None;
        self.updated_at = now;
        true
    }

    /// Adds a trimmed tag. Blank or already present tags are ignored.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let trimmed = tag.trim();
        if trimmed.is_empty() || self.has_tag(trimmed) {
            return false;
        }
        self.tags.push(trimmed.to_string());
        true
    }

    /// Removes a tag by exact (trimmed) match. Absent tags are ignored.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let trimmed = tag.trim();
        let before = self.tags.len();
        self.tags.retain(|existing| existing != trimmed);
        self.tags.len() != before
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let trimmed = tag.trim();
        self.tags.iter().any(|existing| existing == trimmed)
    }

    /// Tags joined with `", "`; empty string when untagged.
    pub fn tags_display(&self) -> String {
        self.tags.join(", ")
    }

    /// Carries a rule and is not itself a generated instance.
    pub fn is_recurrence_root(&self) -> bool {
        self.recurrence_rule.is_some() && self.parent_task_id.is_none()
    }

    pub fn is_recurrence_instance(&self) -> bool {
        self.parent_task_id.is_some()
    }

    pub fn is_recurring(&self) -> bool {
        self.is_recurrence_root() || self.is_recurrence_instance()
    }

    /// Parsed recurrence rule, `None` when absent or not parseable.
    pub fn parsed_recurrence(&self) -> Option<RecurrenceRule> {
        self.recurrence_rule
            .as_deref()
            .and_then(|rule| rule.parse().ok())
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Status change that keeps `completed_at` consistent.
    pub(crate) fn set_status(&mut self, status: TaskStatus, now: NaiveDateTime) {
        match status {
            TaskStatus::Completed if self.status.is_completed() => {}
            TaskStatus::Completed => self.mark_completed_at(now),
            other => {
                self.status = other;
                self.completed_at = None;
            }
        }
    }

    pub(crate) fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
    }

    pub(crate) fn set_assignee(&mut self, assigned_to: Option<UserId>) {
        self.assigned_to = assigned_to;
    }

    pub(crate) fn set_estimated_minutes(&mut self, minutes: u32) {
        self.estimated_minutes = minutes;
    }

    /// Changes the category reference, dropping a stale resolved value.
    pub(crate) fn set_category(&mut self, category: Option<Category>) {
        self.category_id = category.as_ref().map(|value| value.id);
        self.category = category;
    }

    pub(crate) fn resolve_category(&mut self, category: Option<Category>) {
        if category.as_ref().map(|value| value.id) == self.category_id {
            self.category = category;
        }
    }

    pub(crate) fn set_recurrence_rule(&mut self, rule: Option<String>) {
        self.recurrence_rule = rule;
    }

    pub(crate) fn touch(&mut self, now: NaiveDateTime) {
        self.updated_at = now;
    }
}

/// Renders minutes as `"<h>h <m>m"` from one hour upwards, else `"<m>m"`.
pub fn format_minutes(minutes: u32) -> String {
    if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}
