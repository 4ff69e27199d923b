//! Error types for the core library

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Field-level validation messages, keyed by input field name.
///
/// Backed by an ordered map so serialized error bodies are stable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    #[serde(flatten)]
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages recorded for a single field
    pub fn field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("The given data was invalid. {0}")]
    Validation(ValidationErrors),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Category not found: {0}")]
    CategoryNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("title", "The task title is required.");
        errors.add("title", "The task title must be at least 3 characters.");
        errors.add("status", "The selected status is invalid.");

        assert!(!errors.is_empty());
        assert_eq!(errors.field("title").len(), 2);
        assert_eq!(errors.field("status").len(), 1);
        assert!(errors.field("due_date").is_empty());
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "The task title is required.");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"][0], "The task title is required.");
    }

    #[test]
    fn test_display_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("status", "The selected status is invalid.");

        let err = Error::from(errors);
        let text = err.to_string();
        assert!(text.contains("invalid"));
        assert!(text.contains("status"));
    }
}
