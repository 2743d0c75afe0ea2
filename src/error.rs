//! Typed errors for repository and tree operations.
//!
//! Presentation layers dispatch on the variant alone (status line, HTTP
//! status); messages are for humans and never need re-parsing.

use thiserror::Error;

/// Error taxonomy for the data core.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed derived value: unparsable priority or date, blank view
    /// name, or a parent assignment that would create a cycle.
    #[error("{0}")]
    Validation(String),

    /// The targeted task/tag/view id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Unique-name collision on a saved view. Tag name collisions never
    /// raise this; they resolve by get-or-create.
    #[error("{0}")]
    Conflict(String),

    /// I/O, connection, transaction, or interrupt failure from the
    /// storage engine. Propagated unmodified, no retries.
    #[error("database error: {0}")]
    Storage(String),

    /// Malformed parent graph detected while flattening a task tree.
    #[error("{0}")]
    Structural(String),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn task_not_found(task_id: i64) -> Self {
        StoreError::NotFound {
            entity: "task",
            id: task_id.to_string(),
        }
    }

    pub fn tag_not_found(tag_id: i64) -> Self {
        StoreError::NotFound {
            entity: "tag",
            id: tag_id.to_string(),
        }
    }

    pub fn view_not_found(view_id: i64) -> Self {
        StoreError::NotFound {
            entity: "view",
            id: view_id.to_string(),
        }
    }

    pub fn view_not_found_by_name(name: &str) -> Self {
        StoreError::NotFound {
            entity: "view",
            id: name.to_string(),
        }
    }

    pub fn view_name_taken(name: &str) -> Self {
        StoreError::Conflict(format!("view name already exists: {}", name))
    }

    pub fn structural(message: impl Into<String>) -> Self {
        StoreError::Structural(message.into())
    }

    /// Stable code for programmatic handling across process boundaries.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Validation(_) => "VALIDATION",
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::Conflict(_) => "CONFLICT",
            StoreError::Storage(_) => "STORAGE",
            StoreError::Structural(_) => "STRUCTURAL",
        }
    }

    /// True when the underlying SQLite error is a UNIQUE/constraint
    /// violation. Used to map duplicate view names onto `Conflict`.
    pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<refinery::Error> for StoreError {
    fn from(err: refinery::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(format!("filter encoding: {}", err))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
