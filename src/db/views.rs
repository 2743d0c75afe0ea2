//! Saved views: named filters persisted as JSON.

use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use super::{Database, now_ms};
use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;
use crate::types::View;

impl Database {
    /// Insert (`id: None`) or update (`id: Some`) a named view.
    ///
    /// Names are trimmed and unique; a collision raises `Conflict`,
    /// updating a missing id raises `NotFound`. Returns the stored view,
    /// filter round-tripped through its JSON form.
    pub fn save_view(&self, id: Option<i64>, name: &str, filter: &Filter) -> StoreResult<View> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("view name is required"));
        }

        let filter_json = serde_json::to_string(filter)?;
        let now = now_ms();

        self.with_conn(|conn| {
            let view_id = match id {
                None => {
                    conn.execute(
                        "INSERT INTO views (name, filter_json, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![name, filter_json, now, now],
                    )
                    .map_err(|err| map_name_conflict(err, name))?;
                    conn.last_insert_rowid()
                }
                Some(view_id) => {
                    let updated = conn
                        .execute(
                            "UPDATE views SET name = ?1, filter_json = ?2, updated_at = ?3
                             WHERE id = ?4",
                            params![name, filter_json, now, view_id],
                        )
                        .map_err(|err| map_name_conflict(err, name))?;
                    if updated == 0 {
                        return Err(StoreError::view_not_found(view_id));
                    }
                    view_id
                }
            };

            debug!(view_id, name, "saved view");
            get_view_internal(conn, view_id)
        })
    }

    /// All views, ordered by name.
    pub fn list_views(&self) -> StoreResult<Vec<View>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, filter_json, created_at, updated_at
                 FROM views
                 ORDER BY name ASC",
            )?;

            let views = stmt
                .query_map([], parse_view_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(views)
        })
    }

    /// Delete a view by id.
    pub fn delete_view(&self, view_id: i64) -> StoreResult<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM views WHERE id = ?1", params![view_id])?;
            if deleted == 0 {
                return Err(StoreError::view_not_found(view_id));
            }

            debug!(view_id, "deleted view");
            Ok(())
        })
    }

    /// Look a view up by its exact (trimmed) name.
    pub fn get_view_by_name(&self, name: &str) -> StoreResult<View> {
        let name = name.trim();

        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, filter_json, created_at, updated_at
                 FROM views
                 WHERE name = ?1",
                params![name],
                parse_view_row,
            )
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => StoreError::view_not_found_by_name(name),
                other => other.into(),
            })
        })
    }
}

fn get_view_internal(conn: &Connection, view_id: i64) -> StoreResult<View> {
    conn.query_row(
        "SELECT id, name, filter_json, created_at, updated_at
         FROM views
         WHERE id = ?1",
        params![view_id],
        parse_view_row,
    )
    .map_err(|err| match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::view_not_found(view_id),
        other => other.into(),
    })
}

fn parse_view_row(row: &Row) -> rusqlite::Result<View> {
    let filter_json: String = row.get(2)?;
    let filter = serde_json::from_str(&filter_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    Ok(View {
        id: row.get(0)?,
        name: row.get(1)?,
        filter,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn map_name_conflict(err: rusqlite::Error, name: &str) -> StoreError {
    if StoreError::is_constraint_violation(&err) {
        StoreError::view_name_taken(name)
    } else {
        err.into()
    }
}
