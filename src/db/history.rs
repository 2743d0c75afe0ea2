//! Append-only change history for tasks.

use rusqlite::{Connection, Row, params};
use rusqlite::types::Type;

use super::{Database, now_ms};
use crate::error::StoreResult;
use crate::types::{EventType, HistoryEntry};

impl Database {
    /// History entries for a task, oldest first.
    ///
    /// The trail has no foreign key on the task, so it still answers
    /// after the task row is gone, ending with the `deleted` entry.
    pub fn list_history(&self, task_id: i64) -> StoreResult<Vec<HistoryEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, task_id, event_type, details, created_at
                 FROM history
                 WHERE task_id = ?1
                 ORDER BY id ASC",
            )?;

            let entries = stmt
                .query_map(params![task_id], parse_history_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(entries)
        })
    }
}

/// Record one event on the caller's transaction, so the mutation and
/// its audit record commit or roll back together.
pub(crate) fn append_history(
    conn: &Connection,
    task_id: i64,
    event_type: EventType,
    details: &str,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO history (task_id, event_type, details, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![task_id, event_type.as_str(), details, now_ms()],
    )?;

    Ok(())
}

fn parse_history_row(row: &Row) -> rusqlite::Result<HistoryEntry> {
    let raw: String = row.get(2)?;
    let event_type = EventType::from_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown event type: {}", raw).into(),
        )
    })?;

    Ok(HistoryEntry {
        id: row.get(0)?,
        task_id: row.get(1)?,
        event_type,
        details: row.get(3)?,
        created_at: row.get(4)?,
    })
}
