//! Per-guild channel configuration.

use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};

use crate::{Database, DbError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ServerConfig {
    pub guild_id: i64,
    pub admin_channel_id: Option<i64>,
    pub noitu_channel_id: Option<i64>,
}

impl Database {
    pub fn get_server_config(&self, guild_id: i64) -> Result<Option<ServerConfig>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT guild_id, admin_channel_id, noitu_channel_id FROM server_config WHERE guild_id = ?1",
            )?;
            let config = stmt
                .query_row([guild_id], |row| {
                    Ok(ServerConfig {
                        guild_id: row.get(0)?,
                        admin_channel_id: row.get(1)?,
                        noitu_channel_id: row.get(2)?,
                    })
                })
                .optional()?;
            Ok(config)
        })
    }

    /// Set the admin channel, keeping any configured word-chain channel.
    pub fn set_admin_channel(&self, guild_id: i64, channel_id: Option<i64>) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO server_config (guild_id, admin_channel_id) VALUES (?1, ?2)
                 ON CONFLICT(guild_id) DO UPDATE SET admin_channel_id = excluded.admin_channel_id",
                rusqlite::params![guild_id, channel_id],
            )?;
            Ok(())
        })
    }

    /// Set the word-chain (noitu) channel, keeping any configured admin channel.
    pub fn set_noitu_channel(&self, guild_id: i64, channel_id: Option<i64>) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO server_config (guild_id, noitu_channel_id) VALUES (?1, ?2)
                 ON CONFLICT(guild_id) DO UPDATE SET noitu_channel_id = excluded.noitu_channel_id",
                rusqlite::params![guild_id, channel_id],
            )?;
            Ok(())
        })
    }

    pub fn delete_server_config(&self, guild_id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM server_config WHERE guild_id = ?1", [guild_id])?;
            Ok(())
        })
    }
}
