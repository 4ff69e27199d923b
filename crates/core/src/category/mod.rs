//! Category module
//!
//! This module contains category types and their persistent store.

mod model;
mod store;

pub use model::{Category, CategoryWithCount};
pub use store::CategoryStore;
