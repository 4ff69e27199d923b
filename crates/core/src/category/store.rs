//! Category persistent store
//!
//! Provides file-based persistence for categories. The public API surface
//! is read-mostly; categories enter the store through seeding and the
//! `create` call.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Error;
use crate::Result;

use super::model::Category;

/// Names written when a store starts empty, so the read-only category
/// endpoints have data on first boot.
const DEFAULT_CATEGORIES: [&str; 3] = ["Personal", "Shopping", "Work"];

/// Thread-safe category store with file persistence
#[derive(Clone)]
pub struct CategoryStore {
    /// In-memory cache of categories
    categories: Arc<RwLock<HashMap<Uuid, Category>>>,
    /// Path to the categories JSON file
    file_path: PathBuf,
}

impl CategoryStore {
    /// Create a new CategoryStore with the given file path
    pub async fn new(file_path: PathBuf) -> Result<Self> {
        let categories = if file_path.exists() {
            let content = tokio::fs::read_to_string(&file_path)
                .await
                .map_err(|e| Error::Storage(format!("Failed to read categories file: {}", e)))?;
            serde_json::from_str(&content)
                .map_err(|e| Error::Storage(format!("Failed to parse categories file: {}", e)))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            categories: Arc::new(RwLock::new(categories)),
            file_path,
        })
    }

    /// Insert the default categories if the store is empty
    pub async fn seed_defaults(&self) -> Result<()> {
        {
            let categories = self.categories.read().await;
            if !categories.is_empty() {
                return Ok(());
            }
        }

        for name in DEFAULT_CATEGORIES {
            self.create(name).await?;
        }
        Ok(())
    }

    /// Create a category
    pub async fn create(&self, name: impl Into<String>) -> Result<Category> {
        let category = Category::new(name);
        {
            let mut categories = self.categories.write().await;
            categories.insert(category.id, category.clone());
        }
        self.persist().await?;
        Ok(category)
    }

    /// Get a category by ID
    pub async fn get(&self, id: Uuid) -> Option<Category> {
        let categories = self.categories.read().await;
        categories.get(&id).cloned()
    }

    /// Whether a category with this ID exists
    pub async fn exists(&self, id: Uuid) -> bool {
        let categories = self.categories.read().await;
        categories.contains_key(&id)
    }

    /// List all categories, ordered by name
    pub async fn list(&self) -> Vec<Category> {
        let categories = self.categories.read().await;
        let mut list: Vec<Category> = categories.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        list
    }

    /// Persist the current state to file
    async fn persist(&self) -> Result<()> {
        let categories = self.categories.read().await;
        let content = serde_json::to_string_pretty(&*categories)
            .map_err(|e| Error::Storage(format!("Failed to serialize categories: {}", e)))?;

        // Ensure parent directory exists
        if let Some(parent) = self.file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("Failed to create directory: {}", e)))?;
        }

        tokio::fs::write(&self.file_path, content)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write categories file: {}", e)))?;

        Ok(())
    }
}
