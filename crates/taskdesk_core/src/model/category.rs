//! Task category model.

use super::CategoryId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Validated input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    /// `#RRGGBB` color used by list views.
    pub color: Option<String>,
}

/// Named grouping referenced by tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NewCategory {
    pub fn into_category(self, id: CategoryId, now: NaiveDateTime) -> Category {
        Category {
            id,
            name: self.name,
            description: self.description,
            color: self.color,
            created_at: now,
        }
    }
}
