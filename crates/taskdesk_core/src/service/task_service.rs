//! Task use-case service.
//!
//! # Responsibility
//! - Create, update and complete tasks after validating input and references.
//! - Log work time, maintain tags, and spawn recurrence instances.
//!
//! # Invariants
//! - Creator, assignee and category references must exist before a write.
//! - Returned tasks always carry their resolved category when one is set.
//! - Only recurrence roots (rule set, no parent) can spawn instances.

use super::{report, ServiceError, ServiceResult};
use crate::model::category::Category;
use crate::model::priority::Priority;
use crate::model::recurrence::RecurrenceRule;
use crate::model::status::TaskStatus;
use crate::model::task::{NewTask, Task};
use crate::model::{local_now, local_today, CategoryId, TaskId, UserId};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::task_repo::{TaskListQuery, TaskRepository};
use crate::repo::user_repo::UserRepository;
use crate::validation::{
    validate_description, validate_id, validate_logged_minutes, validate_recurrence_rule,
    validate_tag, validate_task_title, ValidationError,
};
use chrono::NaiveDate;
use log::info;

/// Presentation input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
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
}

impl CreateTaskRequest {
    /// Request with only the required fields; everything else defaulted.
    pub fn new(title: impl Into<String>, created_by: UserId) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::default(),
            due_date: None,
            assigned_to: None,
            created_by,
            estimated_minutes: 0,
            category_id: None,
            tags: Vec::new(),
            recurrence_rule: None,
        }
    }
}

/// Partial update. `None` leaves a field unchanged; for optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assigned_to: Option<Option<UserId>>,
    pub estimated_minutes: Option<u32>,
    pub category_id: Option<Option<CategoryId>>,
    pub recurrence_rule: Option<Option<String>>,
}

/// Task service facade over task, user and category ports.
pub struct TaskService<T, U, C>
where
    T: TaskRepository,
    U: UserRepository,
    C: CategoryRepository,
{
    tasks: T,
    users: U,
    categories: C,
}

impl<T, U, C> TaskService<T, U, C>
where
    T: TaskRepository,
    U: UserRepository,
    C: CategoryRepository,
{
    pub fn new(tasks: T, users: U, categories: C) -> Self {
        Self {
            tasks,
            users,
            categories,
        }
    }

    /// Creates a task in `Todo` status.
    ///
    /// # Errors
    /// - `InvalidInput` for blank/oversized text, bad ids or a bad rule.
    /// - `NotFound` when creator, assignee or category does not exist.
    pub fn create_task(&self, request: CreateTaskRequest) -> ServiceResult<Task> {
        report("task_create", self.create_task_inner(request))
    }

    /// Looks a task up by id. Absence is `Ok(None)`.
    pub fn find_task_by_id(&self, id: i64) -> ServiceResult<Option<Task>> {
        report("task_find", self.find_task_inner(id))
    }

    pub fn update_task(&self, id: i64, update: TaskUpdate) -> ServiceResult<Task> {
        report("task_update", self.update_task_inner(id, update))
    }

    /// Marks a task completed. Completing an already completed task keeps
    /// its original completion time.
    pub fn complete_task(&self, id: i64) -> ServiceResult<Task> {
        report(
            "task_complete",
            self.mutate(id, |task, now| {
                if task.status().is_completed() {
                    return Ok(false);
                }
                task.mark_completed_at(now);
                Ok(true)
            }),
        )
    }

    /// Moves a completed task back to `Todo`.
    pub fn reopen_task(&self, id: i64) -> ServiceResult<Task> {
        report("task_reopen", self.mutate(id, |task, now| Ok(task.reopen_at(now))))
    }

    /// Adds worked minutes (must be > 0).
    pub fn log_time(&self, id: i64, minutes: u32) -> ServiceResult<Task> {
        report(
            "task_log_time",
            validate_logged_minutes(minutes)
                .map_err(ServiceError::from)
                .and_then(|minutes| {
                    self.mutate(id, |task, now| {
                        task.add_time_worked_at(minutes, now);
                        Ok(true)
                    })
                }),
        )
    }

    /// Adds a tag; an existing tag leaves the task unchanged.
    pub fn add_tag(&self, id: i64, tag: &str) -> ServiceResult<Task> {
        report(
            "task_add_tag",
            validate_tag(tag)
                .map_err(ServiceError::from)
                .and_then(|tag| self.mutate(id, |task, _| Ok(task.add_tag(&tag)))),
        )
    }

    /// Removes a tag; a missing tag leaves the task unchanged.
    pub fn remove_tag(&self, id: i64, tag: &str) -> ServiceResult<Task> {
        report(
            "task_remove_tag",
            self.mutate(id, |task, _| Ok(task.remove_tag(tag))),
        )
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> ServiceResult<Vec<Task>> {
        report("task_list", self.list_inner(query))
    }

    /// Open tasks whose due date is before `today`.
    pub fn list_overdue_tasks(&self, today: NaiveDate) -> ServiceResult<Vec<Task>> {
        let query = TaskListQuery {
            due_before: Some(today),
            exclude_completed: true,
            ..TaskListQuery::default()
        };
        report(
            "task_list_overdue",
            self.list_inner(&query).map(|tasks| {
                tasks
                    .into_iter()
                    .filter(|task| task.is_overdue_on(today))
                    .collect()
            }),
        )
    }

    pub fn delete_task(&self, id: i64) -> ServiceResult<()> {
        report("task_delete", self.delete_inner(id))
    }

    /// Generates the next instance of a recurring task, dated from today.
    pub fn spawn_next_occurrence(&self, template_id: i64) -> ServiceResult<Task> {
        self.spawn_next_occurrence_on(template_id, local_today())
    }

    /// Generates the next instance of a recurring task.
    ///
    /// The due date is one rule step after the latest existing instance due
    /// date, else after the template's due date, else `today`.
    pub fn spawn_next_occurrence_on(
        &self,
        template_id: i64,
        today: NaiveDate,
    ) -> ServiceResult<Task> {
        report("task_spawn_occurrence", self.spawn_inner(template_id, today))
    }

    fn create_task_inner(&self, request: CreateTaskRequest) -> ServiceResult<Task> {
        let title = validate_task_title(&request.title)?;
        let description = validate_description(&request.description)?;
        let created_by = validate_id("created_by", request.created_by)?;
        let assigned_to = request
            .assigned_to
            .map(|id| validate_id("assigned_to", id))
            .transpose()?;
        let category_id = request
            .category_id
            .map(|id| validate_id("category_id", id))
            .transpose()?;
        let recurrence_rule = request
            .recurrence_rule
            .as_deref()
            .map(validate_recurrence_rule)
            .transpose()?;
        let tags = request
            .tags
            .iter()
            .map(|tag| validate_tag(tag))
            .collect::<Result<Vec<_>, _>>()?;

        self.ensure_user_exists(created_by)?;
        if let Some(assignee) = assigned_to {
            self.ensure_user_exists(assignee)?;
        }
        if let Some(category_id) = category_id {
            self.load_category(category_id)?;
        }

        let task = self.tasks.create_task(&NewTask {
            title,
            description,
            priority: request.priority,
            due_date: request.due_date,
            assigned_to,
            created_by,
            estimated_minutes: request.estimated_minutes,
            category_id,
            tags,
            recurrence_rule,
            parent_task_id: None,
        })?;
        info!(
            "event=task_create module=service status=ok task_id={} recurring={}",
            task.id(),
            task.is_recurrence_root()
        );
        self.resolve(task)
    }

    fn find_task_inner(&self, id: i64) -> ServiceResult<Option<Task>> {
        let id = validate_id("task_id", id)?;
        self.tasks
            .get_task(id)?
            .map(|task| self.resolve(task))
            .transpose()
    }

    fn update_task_inner(&self, id: i64, update: TaskUpdate) -> ServiceResult<Task> {
        let id = validate_id("task_id", id)?;
        let title = update
            .title
            .as_deref()
            .map(validate_task_title)
            .transpose()?;
        let description = update
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?;
        let assigned_to = match update.assigned_to {
            Some(Some(user_id)) => Some(Some(validate_id("assigned_to", user_id)?)),
            other => other,
        };
        let category_id = match update.category_id {
            Some(Some(category_id)) => Some(Some(validate_id("category_id", category_id)?)),
            other => other,
        };
        let recurrence_rule = match update.recurrence_rule.as_ref() {
            Some(Some(rule)) => Some(Some(validate_recurrence_rule(rule)?)),
            Some(None) => Some(None),
            None => None,
        };

        let mut task = self.load_task(id)?;
        if let Some(Some(user_id)) = assigned_to {
            self.ensure_user_exists(user_id)?;
        }
        let category = match category_id {
            Some(Some(category_id)) => Some(Some(self.load_category(category_id)?)),
            Some(None) => Some(None),
            None => None,
        };

        let now = local_now();
        if let Some(title) = title {
            task.set_title(title);
        }
        if let Some(description) = description {
            task.set_description(description);
        }
        if let Some(priority) = update.priority {
            task.set_priority(priority);
        }
        if let Some(status) = update.status {
            task.set_status(status, now);
        }
        if let Some(due_date) = update.due_date {
            task.set_due_date(due_date);
        }
        if let Some(assigned_to) = assigned_to {
            task.set_assignee(assigned_to);
        }
        if let Some(minutes) = update.estimated_minutes {
            task.set_estimated_minutes(minutes);
        }
        if let Some(category) = category {
            task.set_category(category);
        }
        if let Some(rule) = recurrence_rule {
            task.set_recurrence_rule(rule);
        }
        task.touch(now);

        self.tasks.update_task(&task)?;
        info!(
            "event=task_update module=service status=ok task_id={} status_code={}",
            task.id(),
            task.status().as_code()
        );
        self.resolve(task)
    }

    /// Loads a task, applies `change`, and persists it when `change`
    /// reports a modification.
    fn mutate<F>(&self, id: i64, change: F) -> ServiceResult<Task>
    where
        F: FnOnce(&mut Task, chrono::NaiveDateTime) -> ServiceResult<bool>,
    {
        let id = validate_id("task_id", id)?;
        let mut task = self.load_task(id)?;
        let now = local_now();
        if change(&mut task, now)? {
            task.touch(now);
            self.tasks.update_task(&task)?;
        }
        self.resolve(task)
    }

    fn list_inner(&self, query: &TaskListQuery) -> ServiceResult<Vec<Task>> {
        self.tasks
            .list_tasks(query)?
            .into_iter()
            .map(|task| self.resolve(task))
            .collect()
    }

    fn delete_inner(&self, id: i64) -> ServiceResult<()> {
        let id = validate_id("task_id", id)?;
        self.tasks.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    fn spawn_inner(&self, template_id: i64, today: NaiveDate) -> ServiceResult<Task> {
        let template_id = validate_id("task_id", template_id)?;
        let template = self.load_task(template_id)?;
        if !template.is_recurrence_root() {
            return Err(ValidationError::NotRecurrenceRoot {
                task_id: template_id,
            }
            .into());
        }
        let rule: RecurrenceRule = template
            .recurrence_rule()
            .unwrap_or_default()
            .parse()
            .map_err(ValidationError::from)?;

        let anchor = self
            .tasks
            .list_instances(template_id)?
            .iter()
            .filter_map(Task::due_date)
            .max()
            .or(template.due_date());
        let due_date = match anchor {
            Some(date) => rule.next_after(date).ok_or(ServiceError::InconsistentState(
                "recurrence step leaves the supported date range",
            ))?,
            None => today,
        };

        let instance = self.tasks.create_task(&NewTask {
            title: template.title().to_string(),
            description: template.description().to_string(),
            priority: template.priority(),
            due_date: Some(due_date),
            assigned_to: template.assigned_to(),
            created_by: template.created_by(),
            estimated_minutes: template.estimated_minutes(),
            category_id: template.category_id(),
            tags: template.tags().to_vec(),
            recurrence_rule: None,
            parent_task_id: Some(template_id),
        })?;
        info!(
            "event=task_spawn_occurrence module=service status=ok template_id={template_id} task_id={}",
            instance.id()
        );
        self.resolve(instance)
    }

    fn load_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.tasks
            .get_task(id)?
            .ok_or_else(|| ServiceError::not_found("task", id))
    }

    fn ensure_user_exists(&self, id: UserId) -> ServiceResult<()> {
        match self.users.find_by_id(id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("user", id)),
        }
    }

    fn load_category(&self, id: CategoryId) -> ServiceResult<Category> {
        self.categories
            .get_category(id)?
            .ok_or_else(|| ServiceError::not_found("category", id))
    }

    /// Fills in the display category when the port returned only its id.
    fn resolve(&self, mut task: Task) -> ServiceResult<Task> {
        if let (Some(category_id), None) = (task.category_id(), task.category()) {
            let category = self.categories.get_category(category_id)?;
            task.resolve_category(category);
        }
        Ok(task)
    }
}
