//! Audit trail formatting.
//!
//! Pure helpers turning task snapshots into the canonical `details`
//! strings stored in history. Update diffing goes through a structured
//! change list first, so rendering stays swappable and history can be
//! queried structurally without re-parsing text.
//!
//! Output is deterministic: tag sets render lexicographically sorted and
//! dates always format as `YYYY-MM-DD`.

use chrono::NaiveDate;

use crate::types::{Tag, Task};

/// A single field-level difference between two task snapshots.
/// `before`/`after` hold the displayable values, with blank/absent
/// rendered as the literal `none`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub before: String,
    pub after: String,
}

impl FieldChange {
    fn new(field: &'static str, before: &str, after: &str) -> Self {
        Self {
            field,
            before: value_or_none(before),
            after: value_or_none(after),
        }
    }
}

/// Compare two snapshots field by field. Field order is fixed: title,
/// description, status, priority, parent, due, tags.
pub fn diff_tasks(before: &Task, after: &Task) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if before.title != after.title {
        changes.push(FieldChange::new("title", &before.title, &after.title));
    }
    if before.description != after.description {
        changes.push(FieldChange::new(
            "description",
            &before.description,
            &after.description,
        ));
    }
    if before.status != after.status {
        changes.push(FieldChange::new("status", &before.status, &after.status));
    }
    if before.priority != after.priority {
        changes.push(FieldChange::new(
            "priority",
            &before.priority.to_string(),
            &after.priority.to_string(),
        ));
    }

    let parent_before = format_parent(before.parent_task_id);
    let parent_after = format_parent(after.parent_task_id);
    if parent_before != parent_after {
        changes.push(FieldChange::new("parent", &parent_before, &parent_after));
    }

    let due_before = format_due(before.due_at);
    let due_after = format_due(after.due_at);
    if due_before != due_after {
        changes.push(FieldChange::new("due", &due_before, &due_after));
    }

    let tags_before = format_tag_names(&before.tags);
    let tags_after = format_tag_names(&after.tags);
    if tags_before != tags_after {
        changes.push(FieldChange::new("tags", &tags_before, &tags_after));
    }

    changes
}

/// Details string for a `created` history entry.
pub fn format_created(task: &Task) -> String {
    snapshot_summary("created", task)
}

/// Details string for a `deleted` history entry, captured before the row
/// is removed.
pub fn format_deleted(task: &Task) -> String {
    snapshot_summary("deleted", task)
}

/// Details string for an `updated` history entry.
pub fn format_updated(changes: &[FieldChange]) -> String {
    if changes.is_empty() {
        return "updated: no changes".to_string();
    }

    let fragments: Vec<String> = changes
        .iter()
        .map(|c| format!("{}: '{}' -> '{}'", c.field, c.before, c.after))
        .collect();

    format!("updated: {}", fragments.join("; "))
}

fn snapshot_summary(event: &str, task: &Task) -> String {
    format!(
        "{}: title='{}' status={} priority={} due={} tags={}",
        event,
        task.title,
        task.status,
        task.priority,
        format_due(task.due_at),
        format_tag_names(&task.tags),
    )
}

fn value_or_none(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "none".to_string()
    } else {
        trimmed.to_string()
    }
}

fn format_due(due: Option<NaiveDate>) -> String {
    match due {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => "none".to_string(),
    }
}

fn format_parent(parent_id: Option<i64>) -> String {
    match parent_id {
        Some(id) if id != 0 => id.to_string(),
        _ => "none".to_string(),
    }
}

fn format_tag_names(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return "none".to_string();
    }
    let mut names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    names.join(",")
}
