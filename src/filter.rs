//! Query filter passed to [`Database::list_tasks`](crate::db::Database::list_tasks)
//! and serialized for saved views.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A query shape: free-text substring match over title/description, exact
/// status match, ANY-of-tags membership, and inclusive due-date bounds.
/// Blank fields mean "no constraint". The wire form is JSON; absent bounds
/// stay absent on round-trip rather than becoming a zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub query: String,
    pub status: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_before: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_after: Option<NaiveDate>,
}

impl Filter {
    /// True when no predicate is set and a listing returns every task.
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty()
            && self.status.trim().is_empty()
            && self.tags.is_empty()
            && self.due_before.is_none()
            && self.due_after.is_none()
    }
}
