//! Task CRUD, filtered listing, and parent validation.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use std::collections::HashSet;
use tracing::debug;

use super::history::append_history;
use super::tags::{load_tags_for_task, replace_task_tags};
use super::{Database, now_ms};
use crate::audit;
use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;
use crate::types::{EventType, STATUS_TODO, Task, TaskInput};

impl Database {
    /// Create a task from the given input.
    ///
    /// Status is normalized, tag links are written from the normalized
    /// names, and a `created` history entry is rendered from the stored
    /// result. Row, links, and history commit in one transaction; the
    /// returned task is the reloaded row with its tags.
    pub fn create_task(&self, input: TaskInput) -> StoreResult<Task> {
        let now = now_ms();
        let status = normalize_status(&input.status);
        let due_at = input.due_at.map(format_date);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            validate_parent(&tx, None, input.parent_task_id)?;

            tx.execute(
                "INSERT INTO tasks (title, description, status, priority, due_at, parent_task_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    input.title,
                    input.description,
                    status,
                    input.priority,
                    due_at,
                    input.parent_task_id,
                    now,
                    now
                ],
            )?;
            let task_id = tx.last_insert_rowid();

            replace_task_tags(&tx, task_id, &input.tags)?;

            let task = get_task_with_tags_internal(&tx, task_id)?;
            append_history(&tx, task_id, EventType::Created, &audit::format_created(&task))?;

            tx.commit()?;

            debug!(task_id, "created task");
            Ok(task)
        })
    }

    /// Overwrite a task with the given input and record the field diff.
    ///
    /// The whole input is applied, tags included; callers send the full
    /// desired state, not a delta. The `updated` history entry renders
    /// the before/after diff, `updated: no changes` when nothing moved.
    pub fn update_task(&self, task_id: i64, input: TaskInput) -> StoreResult<Task> {
        let now = now_ms();
        let status = normalize_status(&input.status);
        let due_at = input.due_at.map(format_date);

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let before = get_task_with_tags_internal(&tx, task_id)?;
            validate_parent(&tx, Some(task_id), input.parent_task_id)?;

            tx.execute(
                "UPDATE tasks
                 SET title = ?1, description = ?2, status = ?3, priority = ?4,
                     due_at = ?5, parent_task_id = ?6, updated_at = ?7
                 WHERE id = ?8",
                params![
                    input.title,
                    input.description,
                    status,
                    input.priority,
                    due_at,
                    input.parent_task_id,
                    now,
                    task_id
                ],
            )?;

            replace_task_tags(&tx, task_id, &input.tags)?;

            let after = get_task_with_tags_internal(&tx, task_id)?;
            let changes = audit::diff_tasks(&before, &after);
            append_history(
                &tx,
                task_id,
                EventType::Updated,
                &audit::format_updated(&changes),
            )?;

            tx.commit()?;

            debug!(task_id, changed_fields = changes.len(), "updated task");
            Ok(after)
        })
    }

    /// Delete a task, recording a `deleted` entry from its last state.
    ///
    /// The entry is written before the row is removed and has no foreign
    /// key on the task, so the full trail stays readable afterwards.
    /// Children keep their rows; their `parent_task_id` becomes NULL.
    pub fn delete_task(&self, task_id: i64) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let snapshot = get_task_with_tags_internal(&tx, task_id)?;
            append_history(
                &tx,
                task_id,
                EventType::Deleted,
                &audit::format_deleted(&snapshot),
            )?;
            tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;

            tx.commit()?;

            debug!(task_id, "deleted task");
            Ok(())
        })
    }

    /// Load a single task with its tags attached.
    pub fn get_task_with_tags(&self, task_id: i64) -> StoreResult<Task> {
        self.with_conn(|conn| get_task_with_tags_internal(conn, task_id))
    }

    /// List tasks matching every predicate the filter sets.
    ///
    /// Predicates combine: substring over title or description, exact
    /// status, ANY-of-tags membership, inclusive due bounds. Results are
    /// ordered `created_at ASC, id ASC` and carry their tags.
    pub fn list_tasks(&self, filter: &Filter) -> StoreResult<Vec<Task>> {
        let query_text = filter.query.trim();
        let status = filter.status.trim();
        let tag_names: Vec<&str> = filter
            .tags
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();

        self.with_conn(|conn| {
            let mut sql = String::from(
                "SELECT t.id, t.title, t.description, t.status, t.priority, t.due_at, \
                 t.parent_task_id, t.created_at, t.updated_at \
                 FROM tasks t WHERE 1=1",
            );
            let mut param_values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if !query_text.is_empty() {
                let idx = param_values.len() + 1;
                sql.push_str(&format!(
                    " AND (t.title LIKE ?{} OR t.description LIKE ?{})",
                    idx, idx
                ));
                param_values.push(Box::new(format!("%{}%", query_text)));
            }

            if !status.is_empty() {
                sql.push_str(&format!(" AND t.status = ?{}", param_values.len() + 1));
                param_values.push(Box::new(status.to_string()));
            }

            if !tag_names.is_empty() {
                let placeholders: Vec<String> = tag_names
                    .iter()
                    .map(|name| {
                        param_values.push(Box::new(name.to_string()));
                        format!("?{}", param_values.len())
                    })
                    .collect();
                // tags.name collates NOCASE, so membership ignores case.
                sql.push_str(&format!(
                    " AND t.id IN (SELECT tt.task_id FROM task_tags tt \
                     JOIN tags tg ON tg.id = tt.tag_id \
                     WHERE tg.name IN ({}))",
                    placeholders.join(", ")
                ));
            }

            // Due dates are ISO text, so string order is date order. A
            // task with no due date never satisfies a bound.
            if let Some(bound) = filter.due_before {
                sql.push_str(&format!(" AND t.due_at <= ?{}", param_values.len() + 1));
                param_values.push(Box::new(format_date(bound)));
            }

            if let Some(bound) = filter.due_after {
                sql.push_str(&format!(" AND t.due_at >= ?{}", param_values.len() + 1));
                param_values.push(Box::new(format_date(bound)));
            }

            sql.push_str(" ORDER BY t.created_at ASC, t.id ASC");

            let mut stmt = conn.prepare(&sql)?;
            let param_refs: Vec<&dyn rusqlite::ToSql> =
                param_values.iter().map(|b| b.as_ref()).collect();

            let mut tasks = stmt
                .query_map(param_refs.as_slice(), parse_task_row)?
                .collect::<Result<Vec<_>, _>>()?;

            for task in &mut tasks {
                task.tags = load_tags_for_task(conn, task.id)?;
            }

            Ok(tasks)
        })
    }
}

fn get_task_with_tags_internal(conn: &Connection, task_id: i64) -> StoreResult<Task> {
    let mut task = conn
        .query_row(
            "SELECT id, title, description, status, priority, due_at, \
             parent_task_id, created_at, updated_at \
             FROM tasks WHERE id = ?1",
            params![task_id],
            parse_task_row,
        )
        .map_err(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::task_not_found(task_id),
            other => other.into(),
        })?;

    task.tags = load_tags_for_task(conn, task_id)?;
    Ok(task)
}

fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let due_raw: Option<String> = row.get(5)?;
    let due_at = match due_raw {
        Some(raw) => Some(
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
            })?,
        ),
        None => None,
    };

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        due_at,
        parent_task_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        tags: Vec::new(),
    })
}

/// Reject a parent assignment that is missing, self-referential, or
/// would close a cycle. `task_id` is None on create, where the new row
/// cannot be anyone's ancestor yet.
fn validate_parent(
    conn: &Connection,
    task_id: Option<i64>,
    parent_id: Option<i64>,
) -> StoreResult<()> {
    let parent_id = match parent_id {
        Some(id) => id,
        None => return Ok(()),
    };

    if task_id == Some(parent_id) {
        return Err(StoreError::validation("a task cannot be its own parent"));
    }

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
        params![parent_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(StoreError::task_not_found(parent_id));
    }

    let task_id = match task_id {
        Some(id) => id,
        None => return Ok(()),
    };

    // Walk up from the new parent. Reaching this task means the
    // assignment would close a cycle.
    let mut visited = HashSet::new();
    let mut current = parent_id;
    loop {
        if current == task_id {
            return Err(StoreError::validation(format!(
                "setting parent {} on task {} would create a cycle",
                parent_id, task_id
            )));
        }
        if !visited.insert(current) {
            // Pre-existing cycle that never reaches this task.
            return Ok(());
        }

        let next: Option<i64> = conn.query_row(
            "SELECT parent_task_id FROM tasks WHERE id = ?1",
            params![current],
            |row| row.get(0),
        )?;
        match next {
            Some(parent) => current = parent,
            None => return Ok(()),
        }
    }
}

/// Trim and lower-case a status; blank becomes `todo`.
fn normalize_status(status: &str) -> String {
    let normalized = status.trim().to_lowercase();
    if normalized.is_empty() {
        STATUS_TODO.to_string()
    } else {
        normalized
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
