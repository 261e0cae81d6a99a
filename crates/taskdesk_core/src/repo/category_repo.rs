//! Category persistence port and SQLite adapter.

use super::{ensure_connection_ready, RepoResult};
use crate::model::category::{Category, NewCategory};
use crate::model::{local_now, CategoryId};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Storage contract for task categories.
pub trait CategoryRepository {
    /// Case-insensitive name lookup.
    fn category_name_exists(&self, name: &str) -> RepoResult<bool>;
    fn create_category(&self, category: &NewCategory) -> RepoResult<Category>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// All categories ordered by name.
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
}

impl<R: CategoryRepository + ?Sized> CategoryRepository for &R {
    fn category_name_exists(&self, name: &str) -> RepoResult<bool> {
        (**self).category_name_exists(name)
    }

    fn create_category(&self, category: &NewCategory) -> RepoResult<Category> {
        (**self).create_category(category)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        (**self).get_category(id)
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        (**self).list_categories()
    }
}

pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["categories"])?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn category_name_exists(&self, name: &str) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE name = ?1 COLLATE NOCASE);",
            [name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn create_category(&self, category: &NewCategory) -> RepoResult<Category> {
        let now = local_now();
        self.conn.execute(
            "INSERT INTO categories (name, description, color, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                category.name.as_str(),
                category.description.as_deref(),
                category.color.as_deref(),
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(category.clone().into_category(id, now))
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name, description, color, created_at
                 FROM categories
                 WHERE id = ?1;",
                [id],
                parse_category_row,
            )
            .optional()?;
        Ok(category)
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, color, created_at
             FROM categories
             ORDER BY name COLLATE NOCASE ASC, id ASC;",
        )?;
        let categories = stmt
            .query_map([], parse_category_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }
}

fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        color: row.get("color")?,
        created_at: row.get("created_at")?,
    })
}
