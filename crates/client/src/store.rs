//! Reactive task list store
//!
//! Mirrors the server-side filter state and paginated results. Every
//! filter or page mutation triggers exactly one re-fetch; search input
//! is debounced; responses carry sequence numbers so a stale fetch can
//! never overwrite a newer one.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use tm_core::category::CategoryWithCount;
use tm_core::task::{CreateTaskInput, DueFilter, TaskStatus, TaskWithCategory};

use crate::api::TasksApi;
use crate::error::Result;

/// Delay applied to search input before fetching
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Filter fields the UI can set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub status: Option<TaskStatus>,
    pub category_id: Option<Uuid>,
    pub search: String,
    pub due: Option<DueFilter>,
}

impl FilterState {
    /// Whether any filter is active
    pub fn has_filters(&self) -> bool {
        self.status.is_some()
            || self.category_id.is_some()
            || !self.search.is_empty()
            || self.due.is_some()
    }
}

/// Scalar pagination metadata mirrored from the server
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            last_page: 1,
            per_page: 10,
            total: 0,
        }
    }
}

/// Snapshot of the store state
#[derive(Debug, Clone, Default)]
pub struct TaskListState {
    pub tasks: Vec<TaskWithCategory>,
    pub categories: Vec<CategoryWithCount>,
    pub loading: bool,
    pub error: Option<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
    pub filters: FilterState,
    pub pagination: Pagination,
}

/// Reactive task list store
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct TaskStore {
    api: Arc<dyn TasksApi>,
    state: Arc<RwLock<TaskListState>>,
    /// Bumped on every state change; UIs await it
    version: Arc<watch::Sender<u64>>,
    /// Issue counter for fetches
    fetch_seq: Arc<AtomicU64>,
    /// Highest sequence whose response has been applied
    applied_seq: Arc<AtomicU64>,
    pending_search: Arc<Mutex<Option<JoinHandle<()>>>>,
    debounce: Duration,
}

impl TaskStore {
    pub fn new(api: Arc<dyn TasksApi>) -> Self {
        Self::with_debounce(api, SEARCH_DEBOUNCE)
    }

    /// Store with a custom debounce window; tests shrink it
    pub fn with_debounce(api: Arc<dyn TasksApi>, debounce: Duration) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            api,
            state: Arc::new(RwLock::new(TaskListState::default())),
            version: Arc::new(version),
            fetch_seq: Arc::new(AtomicU64::new(0)),
            applied_seq: Arc::new(AtomicU64::new(0)),
            pending_search: Arc::new(Mutex::new(None)),
            debounce,
        }
    }

    /// Current state snapshot
    pub async fn snapshot(&self) -> TaskListState {
        self.state.read().await.clone()
    }

    /// Receiver whose value changes whenever the state does
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    async fn mutate<F: FnOnce(&mut TaskListState)>(&self, f: F) {
        {
            let mut state = self.state.write().await;
            f(&mut state);
        }
        self.bump();
    }

    /// Load tasks and categories concurrently
    pub async fn init(&self) {
        tokio::join!(self.fetch_tasks(), self.fetch_categories());
    }

    /// Fetch the task list for the current filters and page.
    ///
    /// Sets `loading` for the lifetime of the fetch and applies the
    /// response only if no newer fetch has already been applied.
    pub async fn fetch_tasks(&self) {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let (filters, page) = {
            let state = self.state.read().await;
            (state.filters.clone(), state.pagination.current_page)
        };

        self.mutate(|state| {
            state.loading = true;
            state.error = None;
        })
        .await;

        let result = self.api.fetch_tasks(&filters, page).await;

        {
            let mut state = self.state.write().await;

            // Only the newest fetch clears the loading flag; a superseded
            // one still has a successor in flight.
            if seq == self.fetch_seq.load(Ordering::SeqCst) {
                state.loading = false;
            }

            let applied = self.applied_seq.load(Ordering::SeqCst);
            if seq > applied {
                self.applied_seq.store(seq, Ordering::SeqCst);
                match result {
                    Ok(page) => {
                        state.tasks = page.tasks;
                        state.pagination = Pagination {
                            current_page: page.current_page,
                            last_page: page.last_page,
                            per_page: page.per_page,
                            total: page.total,
                        };
                    }
                    Err(e) => {
                        debug!("Task fetch failed: {}", e);
                        state.error = Some(e.to_string());
                    }
                }
            } else {
                debug!("Discarded stale task fetch (seq {} <= {})", seq, applied);
            }
        }
        self.bump();
    }

    /// Fetch the category list
    pub async fn fetch_categories(&self) {
        match self.api.fetch_categories().await {
            Ok(categories) => {
                self.mutate(|state| {
                    state.categories = categories;
                })
                .await;
            }
            Err(e) => {
                debug!("Category fetch failed: {}", e);
                let message = e.to_string();
                self.mutate(|state| {
                    state.error = Some(message);
                })
                .await;
            }
        }
    }

    /// Set the status filter and re-fetch from page 1
    pub async fn set_status(&self, status: Option<TaskStatus>) {
        self.mutate(|state| {
            state.filters.status = status;
            state.pagination.current_page = 1;
        })
        .await;
        self.fetch_tasks().await;
    }

    /// Set the category filter and re-fetch from page 1
    pub async fn set_category(&self, category_id: Option<Uuid>) {
        self.mutate(|state| {
            state.filters.category_id = category_id;
            state.pagination.current_page = 1;
        })
        .await;
        self.fetch_tasks().await;
    }

    /// Set the due filter and re-fetch from page 1
    pub async fn set_due(&self, due: Option<DueFilter>) {
        self.mutate(|state| {
            state.filters.due = due;
            state.pagination.current_page = 1;
        })
        .await;
        self.fetch_tasks().await;
    }

    /// Debounced search input.
    ///
    /// The filter applies and the list re-fetches once input pauses for
    /// the debounce window; rapid keystrokes coalesce into one request.
    pub async fn set_search(&self, term: impl Into<String>) {
        let term = term.into();
        let store = self.clone();
        let delay = self.debounce;

        let mut pending = self.pending_search.lock().await;
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store
                .mutate(|state| {
                    state.filters.search = term;
                    state.pagination.current_page = 1;
                })
                .await;
            store.fetch_tasks().await;
        }));
    }

    /// Jump to a page and re-fetch
    pub async fn set_page(&self, page: u32) {
        self.mutate(|state| {
            state.pagination.current_page = page.max(1);
        })
        .await;
        self.fetch_tasks().await;
    }

    /// Clear every filter and re-fetch from page 1.
    ///
    /// Also cancels any pending debounced search so a stale term cannot
    /// re-apply itself afterwards.
    pub async fn reset_filters(&self) {
        {
            let mut pending = self.pending_search.lock().await;
            if let Some(previous) = pending.take() {
                previous.abort();
            }
        }

        self.mutate(|state| {
            state.filters = FilterState::default();
            state.pagination.current_page = 1;
        })
        .await;
        self.fetch_tasks().await;
    }

    /// Create a task through the API.
    ///
    /// Validation failures land in `field_errors` alongside the global
    /// message; success clears form errors and re-fetches the list.
    pub async fn create_task(&self, input: CreateTaskInput) -> Result<TaskWithCategory> {
        match self.api.create_task(&input).await {
            Ok(task) => {
                self.mutate(|state| {
                    state.field_errors.clear();
                    state.error = None;
                })
                .await;
                self.fetch_tasks().await;
                Ok(task)
            }
            Err(e) => {
                let field_errors = e.field_errors().cloned().unwrap_or_default();
                let message = e.to_string();
                self.mutate(|state| {
                    state.field_errors = field_errors;
                    state.error = Some(message);
                })
                .await;
                Err(e)
            }
        }
    }

    /// Delete a task and drop it from local state without a re-fetch
    pub async fn delete_task(&self, id: Uuid) -> Result<()> {
        if let Err(e) = self.api.delete_task(id).await {
            let message = e.to_string();
            self.mutate(|state| {
                state.error = Some(message);
            })
            .await;
            return Err(e);
        }

        self.mutate(|state| {
            state.tasks.retain(|t| t.id != id);
            state.pagination.total = state.pagination.total.saturating_sub(1);
        })
        .await;
        Ok(())
    }
}
