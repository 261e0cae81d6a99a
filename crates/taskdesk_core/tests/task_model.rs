use chrono::{Duration, NaiveDate, NaiveDateTime};
use taskdesk_core::{Category, Priority, Task, TaskRecord, TaskStatus, TaskValidationError};

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
}

fn record() -> TaskRecord {
    TaskRecord::new(1, "Write report", 1, at(2024, 5, 1, 8))
}

fn task(record: TaskRecord) -> Task {
    Task::try_from(record).unwrap()
}

#[test]
fn open_task_due_yesterday_is_overdue() {
    let yesterday = today() - Duration::days(1);
    let open = task(TaskRecord {
        due_date: Some(yesterday),
        ..record()
    });

    assert!(open.is_overdue_on(today()));
    assert_eq!(open.due_date_status_on(today()), "OVERDUE");
    assert_eq!(open.days_until_due(today()), Some(-1));
}

#[test]
fn completed_task_due_yesterday_is_not_overdue() {
    let yesterday = today() - Duration::days(1);
    let mut done = task(TaskRecord {
        due_date: Some(yesterday),
        ..record()
    });
    done.mark_completed_at(at(2024, 5, 15, 10));

    assert!(!done.is_overdue_on(today()));
    assert_eq!(done.due_date_status_on(today()), "Due: 2024-05-14");
    assert_eq!(done.completed_at(), Some(at(2024, 5, 15, 10)));
}

#[test]
fn due_date_status_covers_today_future_and_missing() {
    let due_today = task(TaskRecord {
        due_date: Some(today()),
        ..record()
    });
    let due_later = task(TaskRecord {
        due_date: Some(today() + Duration::days(3)),
        ..record()
    });
    let undated = task(record());

    assert!(!due_today.is_overdue_on(today()));
    assert_eq!(due_today.due_date_status_on(today()), "DUE TODAY");
    assert_eq!(due_later.due_date_status_on(today()), "Due: 2024-05-18");
    assert_eq!(undated.due_date_status_on(today()), "No due date");
    assert!(!undated.is_overdue_on(today()));
    assert_eq!(undated.days_until_due(today()), None);
}

#[test]
fn efficiency_needs_both_estimate_and_logged_time() {
    let no_estimate = task(TaskRecord {
        actual_minutes: 30,
        ..record()
    });
    let no_actual = task(TaskRecord {
        estimated_minutes: 60,
        ..record()
    });
    let measured = task(TaskRecord {
        estimated_minutes: 60,
        actual_minutes: 30,
        ..record()
    });

    assert_eq!(no_estimate.time_efficiency(), None);
    assert_eq!(no_actual.time_efficiency(), None);
    assert_eq!(measured.time_efficiency(), Some(2.0));
}

#[test]
fn time_displays_use_hours_from_sixty_minutes() {
    let fresh = task(record());
    assert_eq!(fresh.estimated_time_display(), "No estimate");
    assert_eq!(fresh.actual_time_display(), "No time logged");

    let tracked = task(TaskRecord {
        estimated_minutes: 45,
        actual_minutes: 135,
        ..record()
    });
    assert_eq!(tracked.estimated_time_display(), "45m");
    assert_eq!(tracked.actual_time_display(), "2h 15m");
}

#[test]
fn logging_time_accumulates_and_stamps() {
    let mut work = task(record());
    let first = at(2024, 5, 2, 9);
    let second = at(2024, 5, 3, 9);

    work.add_time_worked_at(25, first);
    work.add_time_worked_at(50, second);
    assert_eq!(work.actual_minutes(), 75);
    assert_eq!(work.last_worked_at(), Some(second));
    assert_eq!(work.updated_at(), second);

    work.add_time_worked_at(0, at(2024, 5, 4, 9));
    assert_eq!(work.actual_minutes(), 75);
    assert_eq!(work.updated_at(), second);
}

#[test]
fn tag_operations_are_idempotent() {
    let mut tagged = task(record());

    assert!(tagged.add_tag("x"));
    assert!(!tagged.add_tag("x"));
    assert!(!tagged.add_tag("  x "));
    assert!(!tagged.add_tag("   "));
    assert_eq!(tagged.tags().to_vec(), vec!["x".to_string()]);

    assert!(!tagged.remove_tag("missing"));
    assert_eq!(tagged.tags().len(), 1);

    assert!(tagged.add_tag("Urgent"));
    assert!(tagged.add_tag("urgent"));
    assert_eq!(tagged.tags_display(), "x, Urgent, urgent");
    assert!(tagged.remove_tag("x"));
    assert!(!tagged.has_tag("x"));
}

#[test]
fn stored_tags_are_normalized_on_load() {
    let loaded = task(TaskRecord {
        tags: vec![" a ".into(), "b".into(), "a".into(), "".into()],
        ..record()
    });
    assert_eq!(loaded.tags().to_vec(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn reopening_clears_completion() {
    let mut work = task(record());
    assert!(!work.reopen_at(at(2024, 5, 2, 9)));

    work.mark_completed_at(at(2024, 5, 2, 10));
    assert!(work.status().is_completed());

    assert!(work.reopen_at(at(2024, 5, 2, 11)));
    assert_eq!(work.status(), TaskStatus::Todo);
    assert_eq!(work.completed_at(), None);
}

#[test]
fn broken_records_are_rejected() {
    assert_eq!(
        Task::try_from(TaskRecord {
            status: TaskStatus::Completed,
            ..record()
        })
        .unwrap_err(),
        TaskValidationError::MissingCompletedAt
    );
    assert_eq!(
        Task::try_from(TaskRecord {
            title: "   ".into(),
            ..record()
        })
        .unwrap_err(),
        TaskValidationError::BlankTitle
    );
    assert_eq!(
        Task::try_from(TaskRecord {
            parent_task_id: Some(1),
            ..record()
        })
        .unwrap_err(),
        TaskValidationError::SelfParent(1)
    );
    let category = Category {
        id: 4,
        name: "Work".into(),
        description: None,
        color: None,
        created_at: at(2024, 1, 1, 0),
    };
    assert!(matches!(
        Task::try_from(TaskRecord {
            category_id: Some(3),
            category: Some(category),
            ..record()
        }),
        Err(TaskValidationError::CategoryMismatch { resolved_id: 4, .. })
    ));
}

#[test]
fn recurrence_roles_follow_rule_and_parent() {
    let plain = task(record());
    let root = task(TaskRecord {
        recurrence_rule: Some("FREQ=WEEKLY".into()),
        ..record()
    });
    let instance = task(TaskRecord {
        id: 2,
        recurrence_rule: Some("FREQ=WEEKLY".into()),
        parent_task_id: Some(1),
        ..record()
    });

    assert!(!plain.is_recurring());
    assert!(root.is_recurrence_root());
    assert!(root.parsed_recurrence().is_some());
    assert!(instance.is_recurrence_instance());
    assert!(!instance.is_recurrence_root());
    assert!(instance.is_recurring());
}

#[test]
fn serializes_with_snake_case_enums() {
    let mut work = task(TaskRecord {
        priority: Priority::Urgent,
        due_date: Some(today()),
        ..record()
    });
    work.add_tag("ops");

    let json = serde_json::to_value(&work).unwrap();
    assert_eq!(json["priority"], "urgent");
    assert_eq!(json["status"], "todo");
    assert_eq!(json["due_date"], "2024-05-15");
    assert_eq!(json["tags"], serde_json::json!(["ops"]));

    let back: Task = serde_json::from_value(json).unwrap();
    assert_eq!(back, work);
}

#[test]
fn deserializing_a_completed_task_requires_completion_time() {
    let json = serde_json::to_value(task(record())).unwrap();
    let mut completed = json.clone();
    completed["status"] = serde_json::json!("completed");
    completed["completed_at"] = serde_json::Value::Null;

    let err = serde_json::from_value::<Task>(completed).unwrap_err();
    assert!(err.to_string().contains("completion time"), "{err}");

    let mut broken_ids = json;
    broken_ids["id"] = serde_json::json!(0);
    assert!(serde_json::from_value::<Task>(broken_ids).is_err());
}

#[test]
fn deserializing_normalizes_tags() {
    let mut json = serde_json::to_value(task(record())).unwrap();
    json["tags"] = serde_json::json!(["  a ", "  a ", "", "b"]);

    let loaded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(loaded.tags().to_vec(), vec!["a".to_string(), "b".to_string()]);
}
