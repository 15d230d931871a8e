//! Per-user, per-event currency and contribution ledger rows.

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::{Database, DbError, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipationRecord {
    pub user_id: UserId,
    pub event_key: String,
    pub currency_balance: i64,
    pub contribution_total: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: UserId,
    pub contribution_total: i64,
}

const SELECT_RECORD: &str = "SELECT user_id, event_key, currency_balance, contribution_total,
        COALESCE(created_at, ''), COALESCE(updated_at, '')
     FROM event_participation";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ParticipationRecord> {
    Ok(ParticipationRecord {
        user_id: row.get(0)?,
        event_key: row.get(1)?,
        currency_balance: row.get(2)?,
        contribution_total: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Create the zero row if it does not exist. Returns whether a row was inserted.
///
/// Relies on the primary key: two racing callers both succeed, one inserts.
pub fn ensure(conn: &Connection, user_id: UserId, event_key: &str) -> Result<bool, DbError> {
    let inserted = conn.execute(
        "INSERT INTO event_participation (user_id, event_key, currency_balance, contribution_total)
         VALUES (?1, ?2, 0, 0)
         ON CONFLICT(user_id, event_key) DO NOTHING",
        rusqlite::params![user_id, event_key],
    )?;
    Ok(inserted > 0)
}

pub fn get(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
) -> Result<Option<ParticipationRecord>, DbError> {
    let sql = format!("{SELECT_RECORD} WHERE user_id = ?1 AND event_key = ?2");
    let mut stmt = conn.prepare(&sql)?;
    let record = stmt
        .query_row(rusqlite::params![user_id, event_key], row_to_record)
        .optional()?;
    Ok(record)
}

/// Read the row, creating it first when missing.
pub fn get_or_create(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
) -> Result<ParticipationRecord, DbError> {
    ensure(conn, user_id, event_key)?;
    get(conn, user_id, event_key)?.ok_or_else(|| {
        DbError::NotFound(format!("participation for user {user_id} in {event_key}"))
    })
}

/// Increment the balance. Zero affected rows means the row is missing or
/// the new balance would not fit in an `i64`; nothing is written then.
pub fn credit(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
    amount: i64,
) -> Result<usize, DbError> {
    let n = conn.execute(
        "UPDATE event_participation
         SET currency_balance = currency_balance + ?3, updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ?1 AND event_key = ?2 AND currency_balance <= ?4 - ?3",
        rusqlite::params![user_id, event_key, amount, i64::MAX],
    )?;
    Ok(n)
}

/// Conditional decrement. Zero affected rows means the balance was short
/// (or the row is missing); the balance is left untouched in that case.
pub fn debit(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
    amount: i64,
) -> Result<usize, DbError> {
    let n = conn.execute(
        "UPDATE event_participation
         SET currency_balance = currency_balance - ?3, updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ?1 AND event_key = ?2 AND currency_balance >= ?3",
        rusqlite::params![user_id, event_key, amount],
    )?;
    Ok(n)
}

/// Same contract as [`credit`], for the contribution total.
pub fn add_contribution(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
    amount: i64,
) -> Result<usize, DbError> {
    let n = conn.execute(
        "UPDATE event_participation
         SET contribution_total = contribution_total + ?3, updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ?1 AND event_key = ?2 AND contribution_total <= ?4 - ?3",
        rusqlite::params![user_id, event_key, amount, i64::MAX],
    )?;
    Ok(n)
}

/// Highest contribution first; equal totals are ordered by the smaller user id.
pub fn leaderboard(
    conn: &Connection,
    event_key: &str,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT user_id, contribution_total FROM event_participation
         WHERE event_key = ?1
         ORDER BY contribution_total DESC, user_id ASC
         LIMIT ?2",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(rusqlite::params![event_key, limit], |row| {
        Ok((row.get::<_, UserId>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut entries = Vec::new();
    for (idx, row) in rows.enumerate() {
        let (user_id, contribution_total) = row?;
        entries.push(LeaderboardEntry {
            rank: idx as i64 + 1,
            user_id,
            contribution_total,
        });
    }
    Ok(entries)
}

/// 1-based position of `user_id` under the leaderboard ordering.
pub fn rank(conn: &Connection, user_id: UserId, event_key: &str) -> Result<Option<i64>, DbError> {
    let Some(record) = get(conn, user_id, event_key)? else {
        return Ok(None);
    };
    let ahead: i64 = conn.query_row(
        "SELECT COUNT(*) FROM event_participation
         WHERE event_key = ?1
           AND (contribution_total > ?2 OR (contribution_total = ?2 AND user_id < ?3))",
        rusqlite::params![event_key, record.contribution_total, user_id],
        |row| row.get(0),
    )?;
    Ok(Some(ahead + 1))
}

impl Database {
    pub fn get_participation(
        &self,
        user_id: UserId,
        event_key: &str,
    ) -> Result<Option<ParticipationRecord>, DbError> {
        self.with_conn(|conn| get(conn, user_id, event_key))
    }

    pub fn get_or_create_participation(
        &self,
        user_id: UserId,
        event_key: &str,
    ) -> Result<ParticipationRecord, DbError> {
        self.with_conn(|conn| get_or_create(conn, user_id, event_key))
    }

    pub fn get_leaderboard(
        &self,
        event_key: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, DbError> {
        self.with_conn(|conn| leaderboard(conn, event_key, limit))
    }

    pub fn get_participation_rank(
        &self,
        user_id: UserId,
        event_key: &str,
    ) -> Result<Option<i64>, DbError> {
        self.with_conn(|conn| rank(conn, user_id, event_key))
    }
}
