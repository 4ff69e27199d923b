//! Task filter composition
//!
//! Builds the conjunctive predicate evaluated against stored tasks and
//! the canonical cache key for a filter/page combination.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{Task, TaskStatus};

/// Due-date bucket relative to the current calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueFilter {
    Today,
    Overdue,
    Upcoming,
}

impl DueFilter {
    /// Parse a query value. Unknown values mean "no constraint" and
    /// parse to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "today" => Some(Self::Today),
            "overdue" => Some(Self::Overdue),
            "upcoming" => Some(Self::Upcoming),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Overdue => "overdue",
            Self::Upcoming => "upcoming",
        }
    }
}

/// Conjunctive filter over the task listing
///
/// Absent fields are unconstrained. `page` is 1-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    status: Option<TaskStatus>,
    category_id: Option<Uuid>,
    search: Option<String>,
    due: Option<DueFilter>,
    page: Option<u32>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain to a single status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Constrain to tasks referencing a category
    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Set the search term
    ///
    /// The term is trimmed and lower-cased once here, so evaluation never
    /// normalizes twice. An empty term is no constraint.
    pub fn with_search(mut self, search: impl AsRef<str>) -> Self {
        let term = search.as_ref().trim().to_lowercase();
        self.search = if term.is_empty() { None } else { Some(term) };
        self
    }

    /// Constrain to a due-date bucket
    pub fn with_due(mut self, due: DueFilter) -> Self {
        self.due = Some(due);
        self
    }

    /// Request a specific 1-based page
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page.max(1));
        self
    }

    pub fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    pub fn category_id(&self) -> Option<Uuid> {
        self.category_id
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn due(&self) -> Option<DueFilter> {
        self.due
    }

    /// Requested page, defaulting to 1
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Whether `task` satisfies every set predicate.
    ///
    /// `today` is injected by the caller so due-bucket classification is
    /// deterministic under test.
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }

        if let Some(category_id) = self.category_id {
            if task.category_id != Some(category_id) {
                return false;
            }
        }

        if let Some(term) = self.search.as_deref() {
            let in_title = task.title.to_lowercase().contains(term);
            let in_description = task
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(term))
                .unwrap_or(false);
            if !in_title && !in_description {
                return false;
            }
        }

        if let Some(due) = self.due {
            let Some(due_date) = task.due_date else {
                return false;
            };
            // A completed task due today stays in the today bucket; only
            // overdue and upcoming exclude completed tasks.
            let in_bucket = match due {
                DueFilter::Today => due_date == today,
                DueFilter::Overdue => due_date < today && task.status != TaskStatus::Completed,
                DueFilter::Upcoming => due_date > today && task.status != TaskStatus::Completed,
            };
            if !in_bucket {
                return false;
            }
        }

        true
    }

    /// Canonical cache key for this filter at the given page size.
    ///
    /// Segment order is fixed by construction, so equal filters always
    /// produce equal keys. The free-form search term occupies the final
    /// segment; every other segment holds a constrained value.
    pub fn cache_key(&self, per_page: u32) -> String {
        format!(
            "tasks:status={}:category={}:due={}:page={}:per={}:search={}",
            self.status.map(|s| s.as_str()).unwrap_or(""),
            self.category_id.map(|id| id.to_string()).unwrap_or_default(),
            self.due.map(|d| d.as_str()).unwrap_or(""),
            self.page(),
            per_page,
            self.search.as_deref().unwrap_or(""),
        )
    }
}
