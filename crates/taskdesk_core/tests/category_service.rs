use taskdesk_core::db::open_db_in_memory;
use taskdesk_core::{
    CategoryService, ConflictField, ErrorKind, ServiceError, SqliteCategoryRepository,
    ValidationError,
};

#[test]
fn create_normalizes_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());

    let category = service
        .create_category("  Errands ", Some("   "), Some(" #a1b2c3 "))
        .unwrap();

    assert_eq!(category.name, "Errands");
    assert_eq!(category.description, None);
    assert_eq!(category.color.as_deref(), Some("#A1B2C3"));
    assert_eq!(
        service.find_category_by_id(category.id).unwrap(),
        Some(category)
    );
}

#[test]
fn duplicate_names_conflict_regardless_of_case() {
    let conn = open_db_in_memory().unwrap();
    let service = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());
    service.create_category("Work", None, None).unwrap();

    let err = service.create_category("WORK", None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(matches!(
        err,
        ServiceError::Conflict(conflict) if conflict.field == ConflictField::CategoryName
    ));
}

#[test]
fn invalid_input_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.create_category(" ", None, None).unwrap_err(),
        ServiceError::InvalidInput(ValidationError::BlankCategoryName)
    ));
    assert!(matches!(
        service.create_category("Home", None, Some("red")).unwrap_err(),
        ServiceError::InvalidInput(ValidationError::InvalidColor(_))
    ));
    assert!(matches!(
        service
            .create_category(&"n".repeat(51), None, None)
            .unwrap_err(),
        ServiceError::InvalidInput(ValidationError::CategoryNameTooLong { actual: 51 })
    ));
    assert_eq!(
        service.find_category_by_id(-3).unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
}

#[test]
fn categories_are_listed_by_name() {
    let conn = open_db_in_memory().unwrap();
    let service = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());
    service.create_category("personal", None, None).unwrap();
    service.create_category("Finance", None, None).unwrap();

    let names: Vec<String> = service
        .list_categories()
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, vec!["Finance", "personal"]);
}
