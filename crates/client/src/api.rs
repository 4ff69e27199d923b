//! HTTP client for the /v1 task API

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use tm_core::category::CategoryWithCount;
use tm_core::task::{CreateTaskInput, TaskPage, TaskWithCategory};

use crate::error::{Error, Result};
use crate::store::FilterState;

/// API surface the task store depends on; test doubles implement this
#[async_trait]
pub trait TasksApi: Send + Sync {
    /// Fetch one page of the filtered task listing
    async fn fetch_tasks(&self, filters: &FilterState, page: u32) -> Result<TaskPage>;

    /// Fetch all categories with task counts
    async fn fetch_categories(&self) -> Result<Vec<CategoryWithCount>>;

    /// Create a task
    async fn create_task(&self, input: &CreateTaskInput) -> Result<TaskWithCategory>;

    /// Delete a task
    async fn delete_task(&self, id: Uuid) -> Result<()>;
}

/// Error body the server sends for non-success responses
#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Deserialize)]
struct CategoryListBody {
    data: Vec<CategoryWithCount>,
}

/// reqwest-backed `TasksApi` speaking to a server base URL
pub struct HttpTasksApi {
    client: Client,
    base_url: String,
}

impl HttpTasksApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a response, converting non-success statuses into the error
    /// taxonomy
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let wire = response.json::<WireError>().await.unwrap_or(WireError {
            message: status.to_string(),
            errors: None,
        });

        match status {
            StatusCode::UNPROCESSABLE_ENTITY => Err(Error::Validation {
                message: if wire.message.is_empty() {
                    "The given data was invalid.".to_string()
                } else {
                    wire.message
                },
                errors: wire.errors.unwrap_or_default(),
            }),
            StatusCode::NOT_FOUND => Err(Error::NotFound(wire.message)),
            _ => Err(Error::Server {
                status: status.as_u16(),
                message: wire.message,
            }),
        }
    }
}

#[async_trait]
impl TasksApi for HttpTasksApi {
    async fn fetch_tasks(&self, filters: &FilterState, page: u32) -> Result<TaskPage> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(status) = filters.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(category_id) = filters.category_id {
            query.push(("category_id", category_id.to_string()));
        }
        let search = filters.search.trim();
        if !search.is_empty() {
            query.push(("search", search.to_string()));
        }
        if let Some(due) = filters.due {
            query.push(("due", due.as_str().to_string()));
        }
        query.push(("page", page.to_string()));

        let response = self
            .client
            .get(self.url("/v1/tasks"))
            .query(&query)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn fetch_categories(&self) -> Result<Vec<CategoryWithCount>> {
        let response = self.client.get(self.url("/v1/categories")).send().await?;
        let body: CategoryListBody = Self::decode(response).await?;
        Ok(body.data)
    }

    async fn create_task(&self, input: &CreateTaskInput) -> Result<TaskWithCategory> {
        let response = self
            .client
            .post(self.url("/v1/tasks"))
            .json(input)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete_task(&self, id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/tasks/{}", id)))
            .send()
            .await?;
        // The confirmation body carries only a message
        let _body: serde_json::Value = Self::decode(response).await?;
        Ok(())
    }
}
