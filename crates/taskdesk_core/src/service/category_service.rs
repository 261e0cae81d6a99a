//! Category use-case service.

use super::{report, Conflict, ConflictField, ServiceResult};
use crate::model::category::{Category, NewCategory};
use crate::repo::category_repo::CategoryRepository;
use crate::validation::{validate_category_name, validate_color, validate_description, validate_id};
use log::info;

pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a category; names are unique regardless of letter case.
    pub fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
        color: Option<&str>,
    ) -> ServiceResult<Category> {
        report(
            "category_create",
            self.create_category_inner(name, description, color),
        )
    }

    pub fn find_category_by_id(&self, id: i64) -> ServiceResult<Option<Category>> {
        report("category_find", self.find_inner(id))
    }

    pub fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        report(
            "category_list",
            self.repo.list_categories().map_err(Into::into),
        )
    }

    fn create_category_inner(
        &self,
        name: &str,
        description: Option<&str>,
        color: Option<&str>,
    ) -> ServiceResult<Category> {
        let name = validate_category_name(name)?;
        let description = description
            .map(validate_description)
            .transpose()?
            .filter(|value| !value.is_empty());
        let color = validate_color(color)?;

        if self.repo.category_name_exists(&name)? {
            return Err(Conflict::new(ConflictField::CategoryName, name).into());
        }

        let category = self.repo.create_category(&NewCategory {
            name,
            description,
            color,
        })?;
        info!(
            "event=category_create module=service status=ok category_id={}",
            category.id
        );
        Ok(category)
    }

    fn find_inner(&self, id: i64) -> ServiceResult<Option<Category>> {
        let id = validate_id("category_id", id)?;
        Ok(self.repo.get_category(id)?)
    }
}
