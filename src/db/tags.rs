//! Tag management and task/tag links.

use rusqlite::{Connection, Row, params};
use std::collections::HashSet;
use tracing::debug;

use super::{Database, now_ms};
use crate::error::{StoreError, StoreResult};
use crate::types::Tag;

impl Database {
    /// Replace a task's tag set with the given names.
    ///
    /// Names are normalized (trimmed, blanks dropped, case-insensitive
    /// duplicates collapsed to the first occurrence) and each surviving
    /// name is matched to an existing tag case-insensitively or created
    /// with the casing given here. Idempotent: repeating the call with
    /// the same names leaves the same link set.
    pub fn set_task_tags(&self, task_id: i64, names: &[String]) -> StoreResult<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
                params![task_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(StoreError::task_not_found(task_id));
            }

            replace_task_tags(&tx, task_id, names)?;

            tx.commit()?;
            Ok(())
        })
    }

    /// List all tags, ordered case-insensitively by name.
    pub fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, created_at FROM tags ORDER BY name COLLATE NOCASE")?;

            let tags = stmt
                .query_map([], parse_tag_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(tags)
        })
    }

    /// Delete a tag. Its links to tasks go with it; the tasks stay.
    pub fn delete_tag(&self, tag_id: i64) -> StoreResult<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM tags WHERE id = ?1", params![tag_id])?;
            if deleted == 0 {
                return Err(StoreError::tag_not_found(tag_id));
            }

            debug!(tag_id, "deleted tag");
            Ok(())
        })
    }
}

/// Clear all tag links for a task, then relink it to the normalized
/// names in order, get-or-creating each tag. Runs on the caller's
/// transaction so a task mutation and its tag sync commit together.
pub(crate) fn replace_task_tags(
    conn: &Connection,
    task_id: i64,
    names: &[String],
) -> StoreResult<()> {
    conn.execute("DELETE FROM task_tags WHERE task_id = ?1", params![task_id])?;

    for name in normalize_tags(names) {
        let tag_id = get_or_create_tag(conn, &name)?;
        conn.execute(
            "INSERT INTO task_tags (task_id, tag_id) VALUES (?1, ?2)",
            params![task_id, tag_id],
        )?;
    }

    Ok(())
}

/// Tags linked to one task, in link insertion order.
pub(crate) fn load_tags_for_task(conn: &Connection, task_id: i64) -> StoreResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT tg.id, tg.name, tg.created_at
         FROM task_tags tt
         JOIN tags tg ON tg.id = tt.tag_id
         WHERE tt.task_id = ?1
         ORDER BY tt.rowid",
    )?;

    let tags = stmt
        .query_map(params![task_id], parse_tag_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tags)
}

fn parse_tag_row(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn get_or_create_tag(conn: &Connection, name: &str) -> StoreResult<i64> {
    // INSERT OR IGNORE leaves an existing case-insensitive match
    // untouched, so the casing from first creation wins.
    conn.execute(
        "INSERT OR IGNORE INTO tags (name, created_at) VALUES (?1, ?2)",
        params![name, now_ms()],
    )?;

    // The name column's NOCASE collation makes this lookup
    // case-insensitive.
    let tag_id = conn.query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| {
        row.get(0)
    })?;

    Ok(tag_id)
}

/// Trim names, drop blanks, and collapse case-insensitive duplicates to
/// the first occurrence, preserving input order and original casing.
pub(crate) fn normalize_tags(names: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            result.push(trimmed.to_string());
        }
    }

    result
}
