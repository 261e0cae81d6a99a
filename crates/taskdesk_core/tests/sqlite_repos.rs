use chrono::NaiveDate;
use rusqlite::Connection;
use taskdesk_core::db::open_db_in_memory;
use taskdesk_core::{
    CategoryRepository, NewCategory, NewTask, NewUser, Priority, RepoError, SqliteCategoryRepository,
    SqliteTaskRepository, SqliteUserRepository, TaskListQuery, TaskRepository, TaskStatus,
    UserRepository,
};

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        full_name: "Repo User".to_string(),
        is_admin: false,
    }
}

fn new_task(title: &str, created_by: i64) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: String::new(),
        priority: Priority::Medium,
        due_date: None,
        assigned_to: None,
        created_by,
        estimated_minutes: 0,
        category_id: None,
        tags: Vec::new(),
        recurrence_rule: None,
        parent_task_id: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seeded() -> (Connection, i64) {
    let conn = open_db_in_memory().unwrap();
    let owner = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user(&new_user("owner", "owner@example.com"))
        .unwrap()
        .id();
    (conn, owner)
}

#[test]
fn users_round_trip_and_uniqueness_is_enforced() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let created = repo.create_user(&new_user("alice", "Alice@Example.com")).unwrap();
    assert!(created.id() > 0);
    assert_eq!(repo.find_by_id(created.id()).unwrap(), Some(created.clone()));
    assert_eq!(repo.find_by_username("alice").unwrap(), Some(created));
    assert!(repo.username_exists("alice").unwrap());
    assert!(!repo.username_exists("ALICE").unwrap());
    assert!(repo.email_exists("alice@example.com").unwrap());

    let err = repo
        .create_user(&new_user("alice", "other@example.com"))
        .unwrap_err();
    assert!(matches!(err, RepoError::UniqueViolation(message) if message.contains("users.username")));

    let err = repo
        .create_user(&new_user("bob", "ALICE@EXAMPLE.COM"))
        .unwrap_err();
    assert!(matches!(err, RepoError::UniqueViolation(message) if message.contains("users.email")));
}

#[test]
fn users_are_listed_by_username() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.create_user(&new_user("zed", "zed@example.com")).unwrap();
    repo.create_user(&new_user("amy", "amy@example.com")).unwrap();

    let names: Vec<String> = repo
        .list_users()
        .unwrap()
        .iter()
        .map(|user| user.username().to_string())
        .collect();
    assert_eq!(names, vec!["amy", "zed"]);
}

#[test]
fn categories_round_trip_with_case_insensitive_names() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCategoryRepository::try_new(&conn).unwrap();

    let work = repo
        .create_category(&NewCategory {
            name: "Work".to_string(),
            description: Some("Office tasks".to_string()),
            color: Some("#336699".to_string()),
        })
        .unwrap();

    assert_eq!(repo.get_category(work.id).unwrap(), Some(work.clone()));
    assert!(repo.category_name_exists("work").unwrap());
    assert_eq!(repo.get_category(work.id + 1).unwrap(), None);

    let err = repo
        .create_category(&NewCategory {
            name: "WORK".to_string(),
            description: None,
            color: None,
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::UniqueViolation(_)));
}

#[test]
fn tasks_round_trip_with_ordered_tags_and_category() {
    let (conn, owner) = seeded();
    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    let home = categories
        .create_category(&NewCategory {
            name: "Home".to_string(),
            description: None,
            color: None,
        })
        .unwrap();

    let created = tasks
        .create_task(&NewTask {
            priority: Priority::High,
            due_date: Some(date(2024, 6, 1)),
            estimated_minutes: 90,
            category_id: Some(home.id),
            tags: vec!["zeta".into(), "alpha".into(), "zeta".into()],
            ..new_task("Fix sink", owner)
        })
        .unwrap();

    assert_eq!(created.status(), TaskStatus::Todo);
    assert_eq!(created.priority(), Priority::High);
    assert_eq!(created.category(), Some(&home));
    assert_eq!(created.tags().to_vec(), vec!["zeta".to_string(), "alpha".to_string()]);
    assert_eq!(tasks.get_task(created.id()).unwrap(), Some(created));
}

#[test]
fn updates_persist_lifecycle_changes() {
    let (conn, owner) = seeded();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    let mut task = tasks.create_task(&new_task("Write docs", owner)).unwrap();

    task.add_time_worked(40);
    task.add_tag("docs");
    task.mark_completed();
    tasks.update_task(&task).unwrap();

    let stored = tasks.get_task(task.id()).unwrap().unwrap();
    assert_eq!(stored.actual_minutes(), 40);
    assert!(stored.status().is_completed());
    assert!(stored.completed_at().is_some());
    assert!(stored.last_worked_at().is_some());
    assert_eq!(stored.tags().to_vec(), vec!["docs".to_string()]);
}

#[test]
fn missing_rows_are_not_found() {
    let (conn, owner) = seeded();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    let task = tasks.create_task(&new_task("Temporary", owner)).unwrap();

    tasks.delete_task(task.id()).unwrap();
    assert_eq!(tasks.get_task(task.id()).unwrap(), None);
    assert!(matches!(
        tasks.delete_task(task.id()),
        Err(RepoError::NotFound { entity: "task", .. })
    ));
    assert!(matches!(
        tasks.update_task(&task),
        Err(RepoError::NotFound { entity: "task", .. })
    ));
}

#[test]
fn list_filters_and_orders_by_due_date() {
    let (conn, owner) = seeded();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    let undated = tasks.create_task(&new_task("Undated", owner)).unwrap();
    let late = tasks
        .create_task(&NewTask {
            due_date: Some(date(2024, 7, 1)),
            tags: vec!["ops".into()],
            ..new_task("Late", owner)
        })
        .unwrap();
    let early = tasks
        .create_task(&NewTask {
            due_date: Some(date(2024, 6, 1)),
            ..new_task("Early", owner)
        })
        .unwrap();

    let ids = |query: &TaskListQuery| -> Vec<i64> {
        tasks
            .list_tasks(query)
            .unwrap()
            .iter()
            .map(|task| task.id())
            .collect()
    };

    assert_eq!(
        ids(&TaskListQuery::default()),
        vec![early.id(), late.id(), undated.id()]
    );
    assert_eq!(
        ids(&TaskListQuery {
            tag: Some("ops".into()),
            ..TaskListQuery::default()
        }),
        vec![late.id()]
    );
    assert_eq!(
        ids(&TaskListQuery {
            due_before: Some(date(2024, 6, 15)),
            ..TaskListQuery::default()
        }),
        vec![early.id()]
    );
    assert_eq!(
        ids(&TaskListQuery {
            limit: Some(1),
            offset: 1,
            ..TaskListQuery::default()
        }),
        vec![late.id()]
    );
}

#[test]
fn deleting_a_root_detaches_its_instances() {
    let (conn, owner) = seeded();
    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    let root = tasks
        .create_task(&NewTask {
            recurrence_rule: Some("FREQ=DAILY".into()),
            ..new_task("Standup", owner)
        })
        .unwrap();
    let instance = tasks
        .create_task(&NewTask {
            parent_task_id: Some(root.id()),
            ..new_task("Standup", owner)
        })
        .unwrap();
    assert_eq!(tasks.list_instances(root.id()).unwrap().len(), 1);

    tasks.delete_task(root.id()).unwrap();

    let orphan = tasks.get_task(instance.id()).unwrap().unwrap();
    assert_eq!(orphan.parent_task_id(), None);
}
