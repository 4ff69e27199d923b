//! Task module
//!
//! This module contains task-related types and logic: the models, the
//! filter composer, storage, the query cache and the orchestration
//! service.

mod cache;
mod file_store;
mod filter;
mod model;
mod repository;
mod service;

pub use cache::QueryCache;
pub use file_store::FileTaskStore;
pub use filter::{DueFilter, TaskFilter};
pub use model::*;
pub use repository::TaskRepository;
pub use service::{CreateTaskInput, TaskService, DEFAULT_PER_PAGE};
