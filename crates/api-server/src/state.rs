//! Application state

use std::path::PathBuf;
use std::sync::Arc;

use tm_core::category::CategoryStore;
use tm_core::notify::ChannelNotifier;
use tm_core::task::{FileTaskStore, TaskService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub service: TaskService,
    pub notifier: ChannelNotifier,
}

impl AppState {
    /// Create a new AppState with the given data directory
    pub async fn new(data_dir: PathBuf) -> tm_core::Result<Self> {
        let categories = CategoryStore::new(data_dir.join("categories.json")).await?;
        categories.seed_defaults().await?;

        let task_store =
            FileTaskStore::new(data_dir.join("tasks.json"), categories.clone()).await?;

        let notifier = ChannelNotifier::new();
        let service = TaskService::new(
            Arc::new(task_store),
            categories,
            Arc::new(notifier.clone()),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { service, notifier }),
        })
    }

    /// Get reference to the task service
    pub fn service(&self) -> &TaskService {
        &self.inner.service
    }

    /// Notifier handle for event subscriptions
    pub fn notifier(&self) -> &ChannelNotifier {
        &self.inner.notifier
    }
}
