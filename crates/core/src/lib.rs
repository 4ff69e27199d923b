//! Core library for the task manager
//!
//! This crate contains the core business logic, including:
//! - Task models, filtering and pagination
//! - Category management
//! - Query caching and invalidation
//! - The task orchestration service and its notification port

pub mod category;
pub mod error;
pub mod notify;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
