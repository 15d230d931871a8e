use rusqlite::Connection;

use crate::DbError;

/// Bring tables created by the old setup scripts up to the current schema.
pub(super) fn migrate_legacy_tables(conn: &Connection) -> Result<(), DbError> {
    migrate_server_config_noitu_channel(conn)?;
    migrate_global_event_state_updated_at(conn)?;
    migrate_participation_contribution(conn)?;
    Ok(())
}

/// server_config: early versions only stored the admin channel.
fn migrate_server_config_noitu_channel(conn: &Connection) -> Result<(), DbError> {
    if column_exists(conn, "server_config", "noitu_channel_id")? {
        return Ok(());
    }
    tracing::info!("Adding noitu_channel_id column to server_config");
    conn.execute_batch("ALTER TABLE server_config ADD COLUMN noitu_channel_id INTEGER;")?;
    Ok(())
}

/// global_event_state: rows written without a timestamp get one now.
fn migrate_global_event_state_updated_at(conn: &Connection) -> Result<(), DbError> {
    if !column_exists(conn, "global_event_state", "updated_at")? {
        tracing::info!("Adding updated_at column to global_event_state");
        conn.execute_batch("ALTER TABLE global_event_state ADD COLUMN updated_at TIMESTAMP;")?;
    }
    let patched = conn.execute(
        "UPDATE global_event_state SET updated_at = CURRENT_TIMESTAMP WHERE updated_at IS NULL",
        [],
    )?;
    if patched > 0 {
        tracing::info!(rows = patched, "Backfilled global_event_state.updated_at");
    }
    Ok(())
}

/// event_participation: the first release tracked only the balance.
fn migrate_participation_contribution(conn: &Connection) -> Result<(), DbError> {
    if column_exists(conn, "event_participation", "contribution_total")? {
        return Ok(());
    }
    tracing::info!("Adding contribution_total column to event_participation");
    conn.execute_batch(
        "ALTER TABLE event_participation ADD COLUMN contribution_total INTEGER NOT NULL DEFAULT 0;",
    )?;
    Ok(())
}

pub(super) fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DbError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .any(|name| name.as_deref() == Ok(column));
    Ok(exists)
}
