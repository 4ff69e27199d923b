//! File-based task storage implementation
//!
//! Stores tasks as JSON in a file on disk and serves filtered, paginated
//! reads from an in-memory map. Category data is joined at read time
//! through a shared `CategoryStore`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::filter::TaskFilter;
use super::model::{CategoryRef, Task, TaskPage, TaskWithCategory};
use super::repository::TaskRepository;
use crate::category::CategoryStore;
use crate::{Error, Result};

/// File-based task store using JSON
pub struct FileTaskStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of tasks
    cache: RwLock<HashMap<Uuid, Task>>,
    /// Category lookup for read-time joins
    categories: CategoryStore,
}

impl FileTaskStore {
    /// Create a new FileTaskStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>, categories: CategoryStore) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            let tasks: Vec<Task> = serde_json::from_str(&content)?;
            tasks.into_iter().map(|t| (t.id, t)).collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
            categories,
        })
    }

    /// Persist the cache to disk
    async fn persist(&self) -> Result<()> {
        let cache = self.cache.read().await;
        let tasks: Vec<&Task> = cache.values().collect();
        let content = serde_json::to_string_pretty(&tasks)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn attach_category(&self, task: Task) -> TaskWithCategory {
        let category = match task.category_id {
            Some(id) => self.categories.get(id).await.map(|c| CategoryRef::from(&c)),
            None => None,
        };
        TaskWithCategory::new(task, category)
    }
}

#[async_trait]
impl TaskRepository for FileTaskStore {
    async fn get_page(&self, filter: &TaskFilter, per_page: u32) -> Result<TaskPage> {
        let today = Utc::now().date_naive();
        let mut matched: Vec<Task> = {
            let cache = self.cache.read().await;
            cache
                .values()
                .filter(|t| filter.matches(t, today))
                .cloned()
                .collect()
        };

        // Sort by created_at descending (newest first); ties break on id
        // so pagination is stable.
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let per_page = per_page.max(1);
        let total = matched.len() as u64;
        let last_page = total.div_ceil(per_page as u64).max(1) as u32;
        let current_page = filter.page();

        // An out-of-range page echoes the request with an empty data set.
        let offset = (current_page as usize - 1).saturating_mul(per_page as usize);
        let page_tasks: Vec<Task> = matched
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();

        let mut tasks = Vec::with_capacity(page_tasks.len());
        for task in page_tasks {
            tasks.push(self.attach_category(task).await);
        }

        Ok(TaskPage {
            tasks,
            current_page,
            last_page,
            per_page,
            total,
        })
    }

    async fn create(&self, task: Task) -> Result<TaskWithCategory> {
        {
            let mut cache = self.cache.write().await;
            if cache.contains_key(&task.id) {
                return Err(Error::Storage(format!(
                    "Task with ID {} already exists",
                    task.id
                )));
            }
            cache.insert(task.id, task.clone());
        }
        self.persist().await?;
        Ok(self.attach_category(task).await)
    }

    async fn find(&self, id: Uuid) -> Result<Option<TaskWithCategory>> {
        let task = {
            let cache = self.cache.read().await;
            cache.get(&id).cloned()
        };
        match task {
            Some(task) => Ok(Some(self.attach_category(task).await)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let removed = {
            let mut cache = self.cache.write().await;
            cache.remove(&id).is_some()
        };
        if removed {
            self.persist().await?;
        }
        Ok(())
    }

    async fn count_by_category(&self) -> Result<HashMap<Uuid, u64>> {
        let cache = self.cache.read().await;
        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for task in cache.values() {
            if let Some(category_id) = task.category_id {
                *counts.entry(category_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}
