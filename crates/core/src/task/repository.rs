//! Task repository trait
//!
//! Defines the interface for task storage operations.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::filter::TaskFilter;
use super::model::{Task, TaskPage, TaskWithCategory};
use crate::Result;

/// Repository interface for task storage operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Fetch one page of the filtered listing, newest first, with
    /// category data attached. An empty page is a valid result, not an
    /// error.
    async fn get_page(&self, filter: &TaskFilter, per_page: u32) -> Result<TaskPage>;

    /// Persist a new task and return it with its category attached
    async fn create(&self, task: Task) -> Result<TaskWithCategory>;

    /// Look up a task by ID
    async fn find(&self, id: Uuid) -> Result<Option<TaskWithCategory>>;

    /// Remove a task by ID. Removing an absent ID is a no-op at this
    /// layer; existence checks belong to the service above.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Number of tasks per referenced category, derived from the current
    /// task set
    async fn count_by_category(&self) -> Result<HashMap<Uuid, u64>>;
}
