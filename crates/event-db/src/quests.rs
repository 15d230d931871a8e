//! Quest definitions and per-user quest progress.

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::{Database, DbError, UserId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuestKind {
    Daily,
    Fixed,
}

impl QuestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Fixed => "fixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

fn kind_from_sql(idx: usize, raw: String) -> rusqlite::Result<QuestKind> {
    QuestKind::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown quest kind: {raw}").into(),
        )
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestDefinition {
    pub quest_id: String,
    pub event_key: String,
    pub kind: QuestKind,
    pub requirement_type: String,
    pub requirement_count: i64,
    pub reward: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestProgress {
    pub user_id: UserId,
    pub quest_id: String,
    pub event_key: String,
    pub kind: QuestKind,
    pub quest_day: String,
    pub requirement_type: String,
    pub requirement: i64,
    pub reward: i64,
    pub progress_count: i64,
    pub claimed: bool,
    pub claimed_at: Option<String>,
    pub updated_at: String,
}

impl QuestProgress {
    pub fn is_complete(&self) -> bool {
        self.progress_count >= self.requirement
    }

    /// Fixed quests are always current; daily ones only on their own day.
    pub fn is_current(&self, today: &str) -> bool {
        self.kind == QuestKind::Fixed || self.quest_day == today
    }
}

// --- Definitions ---

fn row_to_definition(row: &rusqlite::Row<'_>) -> rusqlite::Result<QuestDefinition> {
    Ok(QuestDefinition {
        quest_id: row.get(0)?,
        event_key: row.get(1)?,
        kind: kind_from_sql(2, row.get(2)?)?,
        requirement_type: row.get(3)?,
        requirement_count: row.get(4)?,
        reward: row.get(5)?,
        description: row.get(6)?,
    })
}

pub fn upsert_definition(conn: &Connection, def: &QuestDefinition) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO quest_definitions
            (quest_id, event_key, kind, requirement_type, requirement_count, reward, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(quest_id) DO UPDATE SET
            event_key = excluded.event_key,
            kind = excluded.kind,
            requirement_type = excluded.requirement_type,
            requirement_count = excluded.requirement_count,
            reward = excluded.reward,
            description = excluded.description",
        rusqlite::params![
            def.quest_id,
            def.event_key,
            def.kind.as_str(),
            def.requirement_type,
            def.requirement_count,
            def.reward,
            def.description,
        ],
    )?;
    Ok(())
}

pub fn get_definition(conn: &Connection, quest_id: &str) -> Result<Option<QuestDefinition>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT quest_id, event_key, kind, requirement_type, requirement_count, reward, description
         FROM quest_definitions WHERE quest_id = ?1",
    )?;
    let def = stmt.query_row([quest_id], row_to_definition).optional()?;
    Ok(def)
}

/// Definitions for an event, optionally filtered by kind, ordered by id.
pub fn list_definitions(
    conn: &Connection,
    event_key: &str,
    kind: Option<QuestKind>,
) -> Result<Vec<QuestDefinition>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT quest_id, event_key, kind, requirement_type, requirement_count, reward, description
         FROM quest_definitions
         WHERE event_key = ?1 AND (?2 IS NULL OR kind = ?2)
         ORDER BY quest_id ASC",
    )?;
    let rows = stmt.query_map(
        rusqlite::params![event_key, kind.map(QuestKind::as_str)],
        row_to_definition,
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub fn delete_definition(conn: &Connection, quest_id: &str) -> Result<bool, DbError> {
    let n = conn.execute("DELETE FROM quest_definitions WHERE quest_id = ?1", [quest_id])?;
    Ok(n > 0)
}

// --- Progress ---

const SELECT_PROGRESS: &str = "SELECT user_id, quest_id, event_key, kind, quest_day, requirement_type,
        requirement, reward, progress_count, claimed, claimed_at, COALESCE(updated_at, '')
     FROM quest_progress";

fn row_to_progress(row: &rusqlite::Row<'_>) -> rusqlite::Result<QuestProgress> {
    Ok(QuestProgress {
        user_id: row.get(0)?,
        quest_id: row.get(1)?,
        event_key: row.get(2)?,
        kind: kind_from_sql(3, row.get(3)?)?,
        quest_day: row.get(4)?,
        requirement_type: row.get(5)?,
        requirement: row.get(6)?,
        reward: row.get(7)?,
        progress_count: row.get(8)?,
        claimed: row.get(9)?,
        claimed_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Assign a quest to a user at zero progress, snapshotting the definition.
/// An existing row for the same quest is left untouched.
pub fn assign(
    conn: &Connection,
    user_id: UserId,
    def: &QuestDefinition,
    quest_day: &str,
) -> Result<bool, DbError> {
    let n = conn.execute(
        "INSERT INTO quest_progress
            (user_id, quest_id, event_key, kind, quest_day, requirement_type, requirement, reward,
             progress_count, claimed, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, false, CURRENT_TIMESTAMP)
         ON CONFLICT(user_id, quest_id) DO NOTHING",
        rusqlite::params![
            user_id,
            def.quest_id,
            def.event_key,
            def.kind.as_str(),
            quest_day,
            def.requirement_type,
            def.requirement_count,
            def.reward,
        ],
    )?;
    Ok(n > 0)
}

pub fn has_daily_for_day(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
    quest_day: &str,
) -> Result<bool, DbError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM quest_progress
            WHERE user_id = ?1 AND event_key = ?2 AND kind = 'daily' AND quest_day = ?3
         )",
        rusqlite::params![user_id, event_key, quest_day],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Drop the user's daily rows that belong to any other day.
pub fn delete_stale_daily(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
    quest_day: &str,
) -> Result<usize, DbError> {
    let n = conn.execute(
        "DELETE FROM quest_progress
         WHERE user_id = ?1 AND event_key = ?2 AND kind = 'daily' AND quest_day != ?3",
        rusqlite::params![user_id, event_key, quest_day],
    )?;
    Ok(n)
}

pub fn get_progress(
    conn: &Connection,
    user_id: UserId,
    quest_id: &str,
) -> Result<Option<QuestProgress>, DbError> {
    let sql = format!("{SELECT_PROGRESS} WHERE user_id = ?1 AND quest_id = ?2");
    let mut stmt = conn.prepare(&sql)?;
    let progress = stmt
        .query_row(rusqlite::params![user_id, quest_id], row_to_progress)
        .optional()?;
    Ok(progress)
}

/// All of a user's quests in an event: daily first, then fixed, by id.
pub fn list_progress(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
) -> Result<Vec<QuestProgress>, DbError> {
    let sql = format!(
        "{SELECT_PROGRESS} WHERE user_id = ?1 AND event_key = ?2
         ORDER BY CASE kind WHEN 'daily' THEN 0 ELSE 1 END, quest_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params![user_id, event_key], row_to_progress)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Add `delta` to an unclaimed quest, capped at its requirement. Daily rows
/// from a day other than `today` are not touched.
/// Returns the number of rows whose count actually changed.
pub fn advance(
    conn: &Connection,
    user_id: UserId,
    quest_id: &str,
    delta: i64,
    today: &str,
) -> Result<usize, DbError> {
    let n = conn.execute(
        "UPDATE quest_progress
         SET progress_count = MIN(requirement, progress_count + ?3), updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ?1 AND quest_id = ?2 AND claimed = false AND progress_count < requirement
           AND (kind = 'fixed' OR quest_day = ?4)",
        rusqlite::params![user_id, quest_id, delta, today],
    )?;
    Ok(n)
}

/// Ids of the user's unclaimed, incomplete quests tracking `requirement_type`,
/// skipping daily rows of any day but `today`.
pub fn open_quests_by_type(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
    requirement_type: &str,
    today: &str,
) -> Result<Vec<String>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT quest_id FROM quest_progress
         WHERE user_id = ?1 AND event_key = ?2 AND requirement_type = ?3
           AND claimed = false AND progress_count < requirement
           AND (kind = 'fixed' OR quest_day = ?4)
         ORDER BY quest_id ASC",
    )?;
    let rows = stmt.query_map(
        rusqlite::params![user_id, event_key, requirement_type, today],
        |row| row.get::<_, String>(0),
    )?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Flip `claimed` for a complete, unclaimed quest that is still current.
/// Zero affected rows means the quest is missing, stale, incomplete, or
/// already claimed.
pub fn mark_claimed(
    conn: &Connection,
    user_id: UserId,
    quest_id: &str,
    today: &str,
) -> Result<usize, DbError> {
    let n = conn.execute(
        "UPDATE quest_progress
         SET claimed = true, claimed_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ?1 AND quest_id = ?2 AND claimed = false AND progress_count >= requirement
           AND (kind = 'fixed' OR quest_day = ?3)",
        rusqlite::params![user_id, quest_id, today],
    )?;
    Ok(n)
}

pub fn delete_progress_for_event(conn: &Connection, event_key: &str) -> Result<usize, DbError> {
    let n = conn.execute("DELETE FROM quest_progress WHERE event_key = ?1", [event_key])?;
    Ok(n)
}

impl Database {
    pub fn upsert_quest_definition(&self, def: &QuestDefinition) -> Result<(), DbError> {
        self.with_conn(|conn| upsert_definition(conn, def))
    }

    pub fn get_quest_definitions(
        &self,
        event_key: &str,
        kind: Option<QuestKind>,
    ) -> Result<Vec<QuestDefinition>, DbError> {
        self.with_conn(|conn| list_definitions(conn, event_key, kind))
    }

    pub fn get_quest_progress(
        &self,
        user_id: UserId,
        quest_id: &str,
    ) -> Result<Option<QuestProgress>, DbError> {
        self.with_conn(|conn| get_progress(conn, user_id, quest_id))
    }

    pub fn list_quest_progress(
        &self,
        user_id: UserId,
        event_key: &str,
    ) -> Result<Vec<QuestProgress>, DbError> {
        self.with_conn(|conn| list_progress(conn, user_id, event_key))
    }
}
