//! Database schema definitions and migrations.

mod migrations;
mod schema_sql;

use rusqlite::Connection;

use crate::DbError;

pub fn run_migrations(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(schema_sql::SCHEMA)?;
    migrations::migrate_legacy_tables(conn)?;
    conn.execute_batch(schema_sql::INDEXES)?;
    Ok(())
}
