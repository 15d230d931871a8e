//! Seasonal event state rows (`global_event_state`).
//!
//! The `state_data` column is opaque JSON text at this layer; decoding into a
//! typed state happens in the engine.

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::{Database, DbError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventStateRow {
    pub event_key: String,
    pub state_data: String,
    pub updated_at: String,
}

fn row_to_state(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventStateRow> {
    Ok(EventStateRow {
        event_key: row.get(0)?,
        state_data: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
    })
}

pub fn get(conn: &Connection, event_key: &str) -> Result<Option<EventStateRow>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT event_key, state_data, updated_at FROM global_event_state WHERE event_key = ?1",
    )?;
    let row = stmt.query_row([event_key], row_to_state).optional()?;
    Ok(row)
}

/// Rows whose `state_data.status` equals `status`, most recently touched first.
///
/// Rows written before the status field existed (a JSON object without
/// `$.status`, or no state at all) are returned when `include_untagged` is set.
pub fn find_by_status(
    conn: &Connection,
    status: &str,
    include_untagged: bool,
) -> Result<Vec<EventStateRow>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT event_key, state_data, updated_at FROM global_event_state
         WHERE CASE
                 WHEN state_data IS NULL OR TRIM(state_data) = '' THEN ?2
                 WHEN json_valid(state_data) AND json_type(state_data) = 'object' THEN
                   COALESCE(json_extract(state_data, '$.status'), CASE WHEN ?2 THEN ?1 END) = ?1
                 ELSE 0
               END
         ORDER BY updated_at DESC, event_key ASC",
    )?;
    let rows = stmt.query_map(rusqlite::params![status, include_untagged], row_to_state)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn list(conn: &Connection) -> Result<Vec<EventStateRow>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT event_key, state_data, updated_at FROM global_event_state
         ORDER BY updated_at DESC, event_key ASC",
    )?;
    let rows = stmt.query_map([], row_to_state)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Insert or overwrite the state row in place.
pub fn put(conn: &Connection, event_key: &str, state_data: &str) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO global_event_state (event_key, state_data, updated_at)
         VALUES (?1, ?2, CURRENT_TIMESTAMP)
         ON CONFLICT(event_key) DO UPDATE SET state_data = ?2, updated_at = CURRENT_TIMESTAMP",
        rusqlite::params![event_key, state_data],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, event_key: &str) -> Result<bool, DbError> {
    let n = conn.execute(
        "DELETE FROM global_event_state WHERE event_key = ?1",
        [event_key],
    )?;
    Ok(n > 0)
}

impl Database {
    pub fn get_event_state(&self, event_key: &str) -> Result<Option<EventStateRow>, DbError> {
        self.with_conn(|conn| get(conn, event_key))
    }

    pub fn list_event_states(&self) -> Result<Vec<EventStateRow>, DbError> {
        self.with_conn(list)
    }

    pub fn put_event_state(&self, event_key: &str, state_data: &str) -> Result<(), DbError> {
        self.with_conn(|conn| put(conn, event_key, state_data))
    }

    pub fn delete_event_state(&self, event_key: &str) -> Result<bool, DbError> {
        self.with_conn(|conn| delete(conn, event_key))
    }
}
