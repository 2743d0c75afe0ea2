//! Core domain types for the task tracker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;

/// Task priority as an integer (higher = more important).
/// Default is 0.
pub type Priority = i64;

/// Well-known status values. Status is free text after normalization;
/// these are the values the stock front ends cycle through.
pub const STATUS_TODO: &str = "todo";
pub const STATUS_DOING: &str = "doing";
pub const STATUS_EVENTUALLY: &str = "eventually";
pub const STATUS_DONE: &str = "done";

/// All well-known statuses, in the order front-end pickers present them.
pub const KNOWN_STATUSES: [&str; 4] = [STATUS_TODO, STATUS_DOING, STATUS_EVENTUALLY, STATUS_DONE];

/// Parse a priority string from a form layer.
pub fn parse_priority(s: &str) -> StoreResult<Priority> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse()
        .map_err(|_| StoreError::validation(format!("invalid priority: {}", s)))
}

/// Parse a due date string from a form layer. Blank means no due date.
pub fn parse_due_date(s: &str) -> StoreResult<Option<NaiveDate>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| StoreError::validation(format!("invalid due date (want YYYY-MM-DD): {}", s)))
}

/// A task row with its tags attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
    pub tags: Vec<Tag>,
}

/// A tag. Names are unique case-insensitively; the casing from first
/// creation is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

/// Write shape for creating or updating a task. Tags replace the task's
/// existing tag set wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: Priority,
    pub due_at: Option<NaiveDate>,
    pub parent_task_id: Option<i64>,
    pub tags: Vec<String>,
}

/// Audit event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Created,
    Updated,
    Deleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Created => "created",
            EventType::Updated => "updated",
            EventType::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(EventType::Created),
            "updated" => Some(EventType::Updated),
            "deleted" => Some(EventType::Deleted),
            _ => None,
        }
    }
}

/// One entry in a task's append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub task_id: i64,
    pub event_type: EventType,
    pub details: String,
    pub created_at: i64,
}

/// A saved, named query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub id: i64,
    pub name: String,
    pub filter: Filter,
    pub created_at: i64,
    pub updated_at: i64,
}
