//! Task persistence port and SQLite adapter.
//!
//! # Responsibility
//! - Store tasks together with their ordered tag list.
//! - Resolve the referenced category on every read.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations commit.
//! - Tag rows are replaced wholesale inside the same transaction as the task row.
//! - Read paths rebuild tasks through `Task::try_from`, rejecting broken rows.

use super::{ensure_connection_ready, RepoError, RepoResult};
use crate::model::category::Category;
use crate::model::priority::Priority;
use crate::model::status::TaskStatus;
use crate::model::task::{NewTask, Task, TaskRecord};
use crate::model::{local_now, CategoryId, TaskId, UserId};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    t.id,
    t.title,
    t.description,
    t.priority,
    t.status,
    t.due_date,
    t.assigned_to,
    t.created_by,
    t.created_at,
    t.updated_at,
    t.completed_at,
    t.estimated_minutes,
    t.actual_minutes,
    t.category_id,
    t.recurrence_rule,
    t.parent_task_id,
    t.last_worked_at,
    c.name AS category_name,
    c.description AS category_description,
    c.color AS category_color,
    c.created_at AS category_created_at
FROM tasks t
LEFT JOIN categories c ON c.id = t.category_id";

/// Filter and pagination options for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<UserId>,
    pub created_by: Option<UserId>,
    pub category_id: Option<CategoryId>,
    /// Exact tag match.
    pub tag: Option<String>,
    /// Only instances generated from this recurrence root.
    pub parent_task_id: Option<TaskId>,
    /// Only tasks whose due date is strictly before this date.
    pub due_before: Option<NaiveDate>,
    pub exclude_completed: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Storage contract consumed by `TaskService`.
pub trait TaskRepository {
    /// Stores a new task and returns it with its assigned id.
    fn create_task(&self, task: &NewTask) -> RepoResult<Task>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Persists every mutable field and the full tag list.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    /// Ordered by due date (undated last), then id.
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    fn list_instances(&self, parent_id: TaskId) -> RepoResult<Vec<Task>>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

impl<R: TaskRepository + ?Sized> TaskRepository for &R {
    fn create_task(&self, task: &NewTask) -> RepoResult<Task> {
        (**self).create_task(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        (**self).get_task(id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        (**self).update_task(task)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        (**self).list_tasks(query)
    }

    fn list_instances(&self, parent_id: TaskId) -> RepoResult<Vec<Task>> {
        (**self).list_instances(parent_id)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        (**self).delete_task(id)
    }
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["tasks", "task_tags", "categories", "users"])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &NewTask) -> RepoResult<Task> {
        let now = local_now();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tasks (
                title,
                description,
                priority,
                status,
                due_date,
                assigned_to,
                created_by,
                created_at,
                updated_at,
                estimated_minutes,
                actual_minutes,
                category_id,
                recurrence_rule,
                parent_task_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9, 0, ?10, ?11, ?12);",
            params![
                task.title.as_str(),
                task.description.as_str(),
                task.priority.as_code(),
                TaskStatus::Todo.as_code(),
                task.due_date,
                task.assigned_to,
                task.created_by,
                now,
                task.estimated_minutes,
                task.category_id,
                task.recurrence_rule.as_deref(),
                task.parent_task_id,
            ],
        )?;
        let id = tx.last_insert_rowid();

        let created = Task::try_from(task.clone().into_record(id, now))?;
        replace_tags(&tx, id, created.tags())?;
        tx.commit()?;

        self.get_task(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("task {id} missing after insert")))
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE t.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks
             SET
                title = ?2,
                description = ?3,
                priority = ?4,
                status = ?5,
                due_date = ?6,
                assigned_to = ?7,
                updated_at = ?8,
                completed_at = ?9,
                estimated_minutes = ?10,
                actual_minutes = ?11,
                category_id = ?12,
                recurrence_rule = ?13,
                parent_task_id = ?14,
                last_worked_at = ?15
             WHERE id = ?1;",
            params![
                task.id(),
                task.title(),
                task.description(),
                task.priority().as_code(),
                task.status().as_code(),
                task.due_date(),
                task.assigned_to(),
                task.updated_at(),
                task.completed_at(),
                task.estimated_minutes(),
                task.actual_minutes(),
                task.category_id(),
                task.recurrence_rule(),
                task.parent_task_id(),
                task.last_worked_at(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "task",
                id: task.id(),
            });
        }

        replace_tags(&tx, task.id(), task.tags())?;
        tx.commit()?;
        Ok(())
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND t.status = ?");
            bind_values.push(Value::Text(status.as_code().to_string()));
        }
        if query.exclude_completed {
            sql.push_str(" AND t.status != ?");
            bind_values.push(Value::Text(TaskStatus::Completed.as_code().to_string()));
        }
        if let Some(user_id) = query.assigned_to {
            sql.push_str(" AND t.assigned_to = ?");
            bind_values.push(Value::Integer(user_id));
        }
        if let Some(user_id) = query.created_by {
            sql.push_str(" AND t.created_by = ?");
            bind_values.push(Value::Integer(user_id));
        }
        if let Some(category_id) = query.category_id {
            sql.push_str(" AND t.category_id = ?");
            bind_values.push(Value::Integer(category_id));
        }
        if let Some(parent_id) = query.parent_task_id {
            sql.push_str(" AND t.parent_task_id = ?");
            bind_values.push(Value::Integer(parent_id));
        }
        if let Some(date) = query.due_before {
            sql.push_str(" AND t.due_date IS NOT NULL AND t.due_date < ?");
            bind_values.push(Value::Text(date.format("%Y-%m-%d").to_string()));
        }
        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1 FROM task_tags tt WHERE tt.task_id = t.id AND tt.tag = ?
                )",
            );
            bind_values.push(Value::Text(tag.trim().to_string()));
        }

        sql.push_str(" ORDER BY t.due_date IS NULL ASC, t.due_date ASC, t.id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(self.conn, row)?);
        }
        Ok(tasks)
    }

    fn list_instances(&self, parent_id: TaskId) -> RepoResult<Vec<Task>> {
        self.list_tasks(&TaskListQuery {
            parent_task_id: Some(parent_id),
            ..TaskListQuery::default()
        })
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "task", id });
        }
        Ok(())
    }
}

fn replace_tags(conn: &Connection, task_id: TaskId, tags: &[String]) -> RepoResult<()> {
    conn.execute("DELETE FROM task_tags WHERE task_id = ?1;", [task_id])?;
    let mut insert =
        conn.prepare("INSERT INTO task_tags (task_id, position, tag) VALUES (?1, ?2, ?3);")?;
    for (position, tag) in tags.iter().enumerate() {
        insert.execute(params![task_id, position as i64, tag.as_str()])?;
    }
    Ok(())
}

fn load_tags(conn: &Connection, task_id: TaskId) -> RepoResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT tag FROM task_tags WHERE task_id = ?1 ORDER BY position ASC;")?;
    let tags = stmt
        .query_map([task_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}

fn parse_task_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Task> {
    let id: TaskId = row.get("id")?;

    let priority_code: String = row.get("priority")?;
    let priority = Priority::ALL
        .into_iter()
        .find(|value| value.as_code() == priority_code)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid priority `{priority_code}` in tasks.priority (id {id})"
            ))
        })?;

    let status_code: String = row.get("status")?;
    let status = TaskStatus::ALL
        .into_iter()
        .find(|value| value.as_code() == status_code)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid status `{status_code}` in tasks.status (id {id})"
            ))
        })?;

    let category_id: Option<CategoryId> = row.get("category_id")?;
    let category_name: Option<String> = row.get("category_name")?;
    let category = match (category_id, category_name) {
        (Some(category_id), Some(name)) => Some(Category {
            id: category_id,
            name,
            description: row.get("category_description")?,
            color: row.get("category_color")?,
            created_at: row.get("category_created_at")?,
        }),
        _ => None,
    };

    let record = TaskRecord {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
        status,
        due_date: row.get("due_date")?,
        assigned_to: row.get("assigned_to")?,
        created_by: row.get("created_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        completed_at: row.get("completed_at")?,
        estimated_minutes: row.get("estimated_minutes")?,
        actual_minutes: row.get("actual_minutes")?,
        category_id,
        category,
        tags: load_tags(conn, id)?,
        recurrence_rule: row.get("recurrence_rule")?,
        parent_task_id: row.get("parent_task_id")?,
        last_worked_at: row.get("last_worked_at")?,
    };

    Task::try_from(record).map_err(|err| {
        RepoError::InvalidData(format!("task {id} violates invariants: {err}"))
    })
}
