//! Category model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named grouping for tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Category read representation with its derived task count
///
/// The count is computed from the task set at read time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWithCount {
    pub id: Uuid,
    pub name: String,
    pub tasks_count: u64,
}

impl CategoryWithCount {
    pub fn new(category: &Category, tasks_count: u64) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            tasks_count,
        }
    }
}
