//! Task orchestration service
//!
//! Sits between the HTTP surface and the repository: validates and
//! normalizes input at the boundary, wraps listing reads in the query
//! cache, flushes that cache on every write, and emits change events.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cache::QueryCache;
use super::filter::TaskFilter;
use super::model::{Task, TaskPage, TaskStatus, TaskWithCategory};
use super::repository::TaskRepository;
use crate::category::{CategoryStore, CategoryWithCount};
use crate::error::ValidationErrors;
use crate::notify::{Notifier, TaskEvent};
use crate::{Error, Result};

/// Default page size for task listings
pub const DEFAULT_PER_PAGE: u32 = 10;

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 255;

/// Raw create input as received at the boundary
///
/// `status` and `due_date` arrive as strings and become typed values
/// during validation; nothing downstream sees raw input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskInput {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
}

/// Task orchestration service
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
    categories: CategoryStore,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
}

impl TaskService {
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        categories: CategoryStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_cache(repository, categories, notifier, QueryCache::new())
    }

    /// Service with a custom cache; tests force expiry this way
    pub fn with_cache(
        repository: Arc<dyn TaskRepository>,
        categories: CategoryStore,
        notifier: Arc<dyn Notifier>,
        cache: QueryCache,
    ) -> Self {
        Self {
            repository,
            categories,
            cache,
            notifier,
        }
    }

    /// One page of the filtered listing, served from cache when fresh
    pub async fn get_tasks(&self, filter: &TaskFilter, per_page: u32) -> Result<TaskPage> {
        let key = filter.cache_key(per_page);
        if let Some(page) = self.cache.get(&key).await {
            debug!("Task query cache hit: {}", key);
            return Ok(page);
        }

        let page = self.repository.get_page(filter, per_page).await?;
        self.cache.insert(key, page.clone()).await;
        Ok(page)
    }

    /// Validate, normalize and persist a new task
    ///
    /// Flushes the query cache and emits `TaskEvent::Created`; a failed
    /// notification is logged and never fails the create.
    pub async fn create_task(&self, input: CreateTaskInput) -> Result<TaskWithCategory> {
        let task = self.validate(input).await?;

        let created = self.repository.create(task).await?;
        self.cache.flush().await;

        info!("Created task {} ({})", created.id, created.title);

        let event = TaskEvent::Created {
            task: created.clone(),
        };
        if let Err(e) = self.notifier.notify(event).await {
            warn!("Failed to notify task creation: {}", e);
        }

        Ok(created)
    }

    /// Look up a task, or fail with `TaskNotFound`
    pub async fn find_task(&self, id: Uuid) -> Result<TaskWithCategory> {
        self.repository
            .find(id)
            .await?
            .ok_or(Error::TaskNotFound(id))
    }

    /// Delete a task after checking it exists
    ///
    /// The store below tolerates a missing ID; this layer does not.
    pub async fn delete_task(&self, id: Uuid) -> Result<()> {
        if self.repository.find(id).await?.is_none() {
            return Err(Error::TaskNotFound(id));
        }

        self.repository.delete(id).await?;
        self.cache.flush().await;

        info!("Deleted task {}", id);
        Ok(())
    }

    /// All categories with their task counts, ordered by name
    ///
    /// Never cached: counts must reflect the task set at the moment of
    /// read.
    pub async fn list_categories(&self) -> Result<Vec<CategoryWithCount>> {
        let counts = self.repository.count_by_category().await?;
        let categories = self.categories.list().await;
        Ok(categories
            .iter()
            .map(|c| CategoryWithCount::new(c, counts.get(&c.id).copied().unwrap_or(0)))
            .collect())
    }

    /// One category with its task count
    pub async fn get_category(&self, id: Uuid) -> Result<CategoryWithCount> {
        let category = self
            .categories
            .get(id)
            .await
            .ok_or(Error::CategoryNotFound(id))?;
        let counts = self.repository.count_by_category().await?;
        Ok(CategoryWithCount::new(
            &category,
            counts.get(&id).copied().unwrap_or(0),
        ))
    }

    /// Convert raw input into a `Task`, collecting every field error
    /// before failing
    async fn validate(&self, input: CreateTaskInput) -> Result<Task> {
        let mut errors = ValidationErrors::new();

        let title = input.title.trim().to_string();
        if title.is_empty() {
            errors.add("title", "The task title is required.");
        } else if title.chars().count() < TITLE_MIN {
            errors.add("title", "The task title must be at least 3 characters.");
        } else if title.chars().count() > TITLE_MAX {
            errors.add("title", "The task title cannot exceed 255 characters.");
        }

        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        // Raw status strings become the enum here and nowhere else
        let status = match input
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            None => TaskStatus::default(),
            Some(raw) => match TaskStatus::parse(raw) {
                Some(status) => status,
                None => {
                    errors.add("status", "The selected status is invalid.");
                    TaskStatus::default()
                }
            },
        };

        let due_date = match input
            .due_date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            None => None,
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => {
                    if date < Utc::now().date_naive() {
                        errors.add("due_date", "The due date must be today or a future date.");
                    }
                    Some(date)
                }
                Err(_) => {
                    errors.add("due_date", "The due date must be a valid date.");
                    None
                }
            },
        };

        if let Some(category_id) = input.category_id {
            // The reference is weak once stored, but it must resolve at
            // write time.
            if !self.categories.exists(category_id).await {
                errors.add("category_id", "The selected category does not exist.");
            }
        }

        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        let mut task = Task::new(title).with_status(status);
        if let Some(description) = description {
            task = task.with_description(description);
        }
        if let Some(date) = due_date {
            task = task.with_due_date(date);
        }
        if let Some(category_id) = input.category_id {
            task = task.with_category(category_id);
        }
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChannelNotifier;
    use crate::task::FileTaskStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    /// Repository wrapper that counts page fetches, for cache assertions
    struct CountingRepo {
        inner: FileTaskStore,
        pages: AtomicUsize,
    }

    impl CountingRepo {
        fn page_fetches(&self) -> usize {
            self.pages.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TaskRepository for CountingRepo {
        async fn get_page(&self, filter: &TaskFilter, per_page: u32) -> Result<TaskPage> {
            self.pages.fetch_add(1, Ordering::SeqCst);
            self.inner.get_page(filter, per_page).await
        }

        async fn create(&self, task: Task) -> Result<TaskWithCategory> {
            self.inner.create(task).await
        }

        async fn find(&self, id: Uuid) -> Result<Option<TaskWithCategory>> {
            self.inner.find(id).await
        }

        async fn delete(&self, id: Uuid) -> Result<()> {
            self.inner.delete(id).await
        }

        async fn count_by_category(&self) -> Result<HashMap<Uuid, u64>> {
            self.inner.count_by_category().await
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<TaskEvent>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, event: TaskEvent) -> Result<()> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _event: TaskEvent) -> Result<()> {
            Err(Error::Notification("channel down".to_string()))
        }
    }

    async fn test_service() -> (TaskService, CategoryStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let categories = CategoryStore::new(temp.path().join("categories.json"))
            .await
            .unwrap();
        let store = FileTaskStore::new(temp.path().join("tasks.json"), categories.clone())
            .await
            .unwrap();
        let service = TaskService::new(
            Arc::new(store),
            categories.clone(),
            Arc::new(ChannelNotifier::new()),
        );
        (service, categories, temp)
    }

    async fn counting_service() -> (TaskService, Arc<CountingRepo>, TempDir) {
        let temp = TempDir::new().unwrap();
        let categories = CategoryStore::new(temp.path().join("categories.json"))
            .await
            .unwrap();
        let store = FileTaskStore::new(temp.path().join("tasks.json"), categories.clone())
            .await
            .unwrap();
        let repo = Arc::new(CountingRepo {
            inner: store,
            pages: AtomicUsize::new(0),
        });
        let service = TaskService::new(
            repo.clone(),
            categories,
            Arc::new(ChannelNotifier::new()),
        );
        (service, repo, temp)
    }

    fn input(title: &str) -> CreateTaskInput {
        CreateTaskInput {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn future_date() -> String {
        (Utc::now().date_naive() + Duration::days(7))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[tokio::test]
    async fn test_create_defaults_to_pending() {
        let (service, _cats, _temp) = test_service().await;

        let created = service.create_task(input("Walk the dog")).await.unwrap();
        assert_eq!(created.status, TaskStatus::Pending);
        assert!(created.due_date.is_none());
        assert!(created.category.is_none());
    }

    #[tokio::test]
    async fn test_create_normalizes_input() {
        let (service, _cats, _temp) = test_service().await;

        let created = service
            .create_task(CreateTaskInput {
                title: "  Walk the dog  ".to_string(),
                description: Some("   ".to_string()),
                status: Some(" completed ".to_string()),
                due_date: Some(format!(" {} ", future_date())),
                category_id: None,
            })
            .await
            .unwrap();

        assert_eq!(created.title, "Walk the dog");
        assert!(created.description.is_none());
        assert_eq!(created.status, TaskStatus::Completed);
        assert!(created.due_date.is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_status() {
        let (service, _cats, _temp) = test_service().await;

        let mut bad = input("Archive me");
        bad.status = Some("archived".to_string());

        match service.create_task(bad).await.unwrap_err() {
            Error::Validation(errors) => {
                assert_eq!(errors.field("status"), ["The selected status is invalid."]);
            }
            e => panic!("Expected Validation error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_create_title_rules() {
        let (service, _cats, _temp) = test_service().await;

        match service.create_task(input("   ")).await.unwrap_err() {
            Error::Validation(errors) => {
                assert_eq!(errors.field("title"), ["The task title is required."]);
            }
            e => panic!("Expected Validation error, got: {:?}", e),
        }

        match service.create_task(input("ab")).await.unwrap_err() {
            Error::Validation(errors) => {
                assert_eq!(
                    errors.field("title"),
                    ["The task title must be at least 3 characters."]
                );
            }
            e => panic!("Expected Validation error, got: {:?}", e),
        }

        // 255 characters is allowed, 256 is not
        service
            .create_task(input(&"a".repeat(255)))
            .await
            .unwrap();
        match service
            .create_task(input(&"a".repeat(256)))
            .await
            .unwrap_err()
        {
            Error::Validation(errors) => {
                assert_eq!(
                    errors.field("title"),
                    ["The task title cannot exceed 255 characters."]
                );
            }
            e => panic!("Expected Validation error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_create_due_date_rules() {
        let (service, _cats, _temp) = test_service().await;

        let mut malformed = input("Dated task");
        malformed.due_date = Some("25-08-2026".to_string());
        match service.create_task(malformed).await.unwrap_err() {
            Error::Validation(errors) => {
                assert_eq!(
                    errors.field("due_date"),
                    ["The due date must be a valid date."]
                );
            }
            e => panic!("Expected Validation error, got: {:?}", e),
        }

        let mut past = input("Dated task");
        past.due_date = Some(
            (Utc::now().date_naive() - Duration::days(1))
                .format("%Y-%m-%d")
                .to_string(),
        );
        match service.create_task(past).await.unwrap_err() {
            Error::Validation(errors) => {
                assert_eq!(
                    errors.field("due_date"),
                    ["The due date must be today or a future date."]
                );
            }
            e => panic!("Expected Validation error, got: {:?}", e),
        }

        // Today is on the allowed boundary
        let mut today = input("Dated task");
        today.due_date = Some(Utc::now().date_naive().format("%Y-%m-%d").to_string());
        service.create_task(today).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category() {
        let (service, _cats, _temp) = test_service().await;

        let mut bad = input("Categorized");
        bad.category_id = Some(Uuid::new_v4());

        match service.create_task(bad).await.unwrap_err() {
            Error::Validation(errors) => {
                assert_eq!(
                    errors.field("category_id"),
                    ["The selected category does not exist."]
                );
            }
            e => panic!("Expected Validation error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_validation_collects_all_field_errors() {
        let (service, _cats, _temp) = test_service().await;

        let bad = CreateTaskInput {
            title: "ab".to_string(),
            description: None,
            status: Some("archived".to_string()),
            due_date: Some("not-a-date".to_string()),
            category_id: Some(Uuid::new_v4()),
        };

        match service.create_task(bad).await.unwrap_err() {
            Error::Validation(errors) => {
                assert!(!errors.field("title").is_empty());
                assert!(!errors.field("status").is_empty());
                assert!(!errors.field("due_date").is_empty());
                assert!(!errors.field("category_id").is_empty());
            }
            e => panic!("Expected Validation error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_get_tasks_serves_repeat_reads_from_cache() {
        let (service, repo, _temp) = counting_service().await;
        service.create_task(input("Cached task")).await.unwrap();

        let filter = TaskFilter::new();
        let first = service.get_tasks(&filter, DEFAULT_PER_PAGE).await.unwrap();
        let second = service.get_tasks(&filter, DEFAULT_PER_PAGE).await.unwrap();

        assert_eq!(first.total, 1);
        assert_eq!(second.total, 1);
        assert_eq!(repo.page_fetches(), 1);

        // A different page size is a different cache entry
        service.get_tasks(&filter, 25).await.unwrap();
        assert_eq!(repo.page_fetches(), 2);
    }

    #[tokio::test]
    async fn test_writes_invalidate_cached_listings() {
        let (service, repo, _temp) = counting_service().await;

        let filter = TaskFilter::new();
        service.get_tasks(&filter, DEFAULT_PER_PAGE).await.unwrap();
        assert_eq!(repo.page_fetches(), 1);

        let created = service.create_task(input("Fresh task")).await.unwrap();
        let after_create = service.get_tasks(&filter, DEFAULT_PER_PAGE).await.unwrap();
        assert_eq!(repo.page_fetches(), 2);
        assert_eq!(after_create.total, 1);

        service.delete_task(created.id).await.unwrap();
        let after_delete = service.get_tasks(&filter, DEFAULT_PER_PAGE).await.unwrap();
        assert_eq!(repo.page_fetches(), 3);
        assert_eq!(after_delete.total, 0);
    }

    #[tokio::test]
    async fn test_expired_cache_entries_refetch() {
        let temp = TempDir::new().unwrap();
        let categories = CategoryStore::new(temp.path().join("categories.json"))
            .await
            .unwrap();
        let store = FileTaskStore::new(temp.path().join("tasks.json"), categories.clone())
            .await
            .unwrap();
        let repo = Arc::new(CountingRepo {
            inner: store,
            pages: AtomicUsize::new(0),
        });
        let service = TaskService::with_cache(
            repo.clone(),
            categories,
            Arc::new(ChannelNotifier::new()),
            QueryCache::with_ttl(std::time::Duration::ZERO),
        );

        let filter = TaskFilter::new();
        service.get_tasks(&filter, DEFAULT_PER_PAGE).await.unwrap();
        service.get_tasks(&filter, DEFAULT_PER_PAGE).await.unwrap();
        assert_eq!(repo.page_fetches(), 2);
    }

    #[tokio::test]
    async fn test_find_task_not_found() {
        let (service, _cats, _temp) = test_service().await;

        match service.find_task(Uuid::new_v4()).await.unwrap_err() {
            Error::TaskNotFound(_) => {}
            e => panic!("Expected TaskNotFound error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_delete_task_requires_existence() {
        let (service, _cats, _temp) = test_service().await;

        match service.delete_task(Uuid::new_v4()).await.unwrap_err() {
            Error::TaskNotFound(_) => {}
            e => panic!("Expected TaskNotFound error, got: {:?}", e),
        }

        let created = service.create_task(input("Short-lived")).await.unwrap();
        service.delete_task(created.id).await.unwrap();
        match service.find_task(created.id).await.unwrap_err() {
            Error::TaskNotFound(_) => {}
            e => panic!("Expected TaskNotFound error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_create_emits_event() {
        let temp = TempDir::new().unwrap();
        let categories = CategoryStore::new(temp.path().join("categories.json"))
            .await
            .unwrap();
        let store = FileTaskStore::new(temp.path().join("tasks.json"), categories.clone())
            .await
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let service = TaskService::new(Arc::new(store), categories, notifier.clone());

        service.create_task(input("Announced")).await.unwrap();

        let events = notifier.events.lock().await;
        assert_eq!(events.len(), 1);
        let TaskEvent::Created { task } = &events[0];
        assert_eq!(task.title, "Announced");
    }

    #[tokio::test]
    async fn test_notify_failure_does_not_fail_create() {
        let temp = TempDir::new().unwrap();
        let categories = CategoryStore::new(temp.path().join("categories.json"))
            .await
            .unwrap();
        let store = FileTaskStore::new(temp.path().join("tasks.json"), categories.clone())
            .await
            .unwrap();
        let service = TaskService::new(Arc::new(store), categories, Arc::new(FailingNotifier));

        let created = service.create_task(input("Still created")).await.unwrap();
        assert_eq!(created.title, "Still created");
        service.find_task(created.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_category_counts_follow_task_writes() {
        let (service, cats, _temp) = test_service().await;
        let errands = cats.create("Errands").await.unwrap();
        cats.create("Work").await.unwrap();

        let mut first = input("Buy milk");
        first.category_id = Some(errands.id);
        let mut second = input("Buy eggs");
        second.category_id = Some(errands.id);

        let kept = service.create_task(first).await.unwrap();
        let dropped = service.create_task(second).await.unwrap();

        let listed = service.list_categories().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Errands");
        assert_eq!(listed[0].tasks_count, 2);
        assert_eq!(listed[1].name, "Work");
        assert_eq!(listed[1].tasks_count, 0);

        service.delete_task(dropped.id).await.unwrap();
        let refreshed = service.get_category(errands.id).await.unwrap();
        assert_eq!(refreshed.tasks_count, 1);

        service.delete_task(kept.id).await.unwrap();
        let emptied = service.get_category(errands.id).await.unwrap();
        assert_eq!(emptied.tasks_count, 0);
    }

    #[tokio::test]
    async fn test_get_category_not_found() {
        let (service, _cats, _temp) = test_service().await;

        match service.get_category(Uuid::new_v4()).await.unwrap_err() {
            Error::CategoryNotFound(_) => {}
            e => panic!("Expected CategoryNotFound error, got: {:?}", e),
        }
    }
}
