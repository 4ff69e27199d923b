//! Client-side state for the task manager
//!
//! This crate provides the API client speaking the /v1 wire contract and
//! a reactive task list store: it mirrors filter state and paginated
//! results, debounces search input, and re-fetches on every filter or
//! page change.

mod api;
mod error;
mod store;

pub use api::{HttpTasksApi, TasksApi};
pub use error::{Error, Result};
pub use store::{FilterState, Pagination, TaskListState, TaskStore};
