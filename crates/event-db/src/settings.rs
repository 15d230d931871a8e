//! Bot settings key-value store.

use std::collections::HashMap;

use rusqlite::OptionalExtension;

use crate::{Database, DbError};

impl Database {
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
        self.with_conn(|conn| {
            let value = conn
                .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?;
            Ok(value)
        })
    }

    pub fn set_setting(&self, key: &str, value: &str, setting_type: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO settings (key, value, setting_type, updated_at) VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, setting_type = ?3, updated_at = CURRENT_TIMESTAMP",
                rusqlite::params![key, value, setting_type],
            )?;
            Ok(())
        })
    }

    /// Insert a setting only when the key is not stored yet.
    pub fn set_setting_if_absent(
        &self,
        key: &str,
        value: &str,
        setting_type: &str,
    ) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT INTO settings (key, value, setting_type, updated_at) VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO NOTHING",
                rusqlite::params![key, value, setting_type],
            )?;
            Ok(n > 0)
        })
    }

    pub fn get_all_settings(&self) -> Result<HashMap<String, String>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            rows.collect::<Result<HashMap<_, _>, _>>().map_err(Into::into)
        })
    }

    pub fn update_settings_bulk(&self, settings: &HashMap<String, String>) -> Result<(), DbError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO settings (key, value, setting_type, updated_at) VALUES (?1, ?2, 'normal', CURRENT_TIMESTAMP)
                     ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = CURRENT_TIMESTAMP",
                )?;
                for (key, value) in settings {
                    stmt.execute(rusqlite::params![key, value])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn delete_setting(&self, key: &str) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM settings WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}
