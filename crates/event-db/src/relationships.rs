//! Relationships between two users and the pet a pair raises together.

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::{Database, DbError, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    pub id: i64,
    pub user_low: UserId,
    pub user_high: UserId,
    pub affinity: i64,
    pub last_interaction: i64,
    pub created_at: String,
}

impl Relationship {
    /// The other member of the pair, if `user_id` is one of them.
    pub fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.user_low {
            Some(self.user_high)
        } else if user_id == self.user_high {
            Some(self.user_low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedPet {
    pub partnership_id: i64,
    pub name: String,
    pub exp: i64,
    pub level: i64,
    pub last_fed: i64,
}

/// Order a pair so that `(a, b)` and `(b, a)` map to the same row.
pub fn normalize_pair(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

fn row_to_relationship(row: &rusqlite::Row<'_>) -> rusqlite::Result<Relationship> {
    Ok(Relationship {
        id: row.get(0)?,
        user_low: row.get(1)?,
        user_high: row.get(2)?,
        affinity: row.get(3)?,
        last_interaction: row.get(4)?,
        created_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}

pub fn get(conn: &Connection, a: UserId, b: UserId) -> Result<Option<Relationship>, DbError> {
    let (low, high) = normalize_pair(a, b);
    let mut stmt = conn.prepare(
        "SELECT id, user_low, user_high, affinity, last_interaction, created_at
         FROM relationships WHERE user_low = ?1 AND user_high = ?2",
    )?;
    let rel = stmt
        .query_row(rusqlite::params![low, high], row_to_relationship)
        .optional()?;
    Ok(rel)
}

/// Create the pair with a first interaction. Returns false if it already existed.
pub fn insert(
    conn: &Connection,
    a: UserId,
    b: UserId,
    affinity: i64,
    now: i64,
) -> Result<bool, DbError> {
    let (low, high) = normalize_pair(a, b);
    let n = conn.execute(
        "INSERT INTO relationships (user_low, user_high, affinity, last_interaction)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_low, user_high) DO NOTHING",
        rusqlite::params![low, high, affinity, now],
    )?;
    Ok(n > 0)
}

/// Add affinity only when the last interaction is at least `cooldown_secs` old.
/// Zero affected rows means the pair is still cooling down (or missing).
pub fn bump_affinity(
    conn: &Connection,
    a: UserId,
    b: UserId,
    gain: i64,
    now: i64,
    cooldown_secs: i64,
) -> Result<usize, DbError> {
    let (low, high) = normalize_pair(a, b);
    let n = conn.execute(
        "UPDATE relationships
         SET affinity = affinity + ?3, last_interaction = ?4
         WHERE user_low = ?1 AND user_high = ?2 AND last_interaction <= ?4 - ?5",
        rusqlite::params![low, high, gain, now, cooldown_secs],
    )?;
    Ok(n)
}

/// A user's relationships, strongest first.
pub fn list_for_user(
    conn: &Connection,
    user_id: UserId,
    limit: usize,
) -> Result<Vec<Relationship>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_low, user_high, affinity, last_interaction, created_at
         FROM relationships
         WHERE user_low = ?1 OR user_high = ?1
         ORDER BY affinity DESC, id ASC
         LIMIT ?2",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(rusqlite::params![user_id, limit], row_to_relationship)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// --- Shared pets ---

pub fn get_pet(conn: &Connection, partnership_id: i64) -> Result<Option<SharedPet>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT partnership_id, name, exp, level, last_fed FROM shared_pets WHERE partnership_id = ?1",
    )?;
    let pet = stmt
        .query_row([partnership_id], |row| {
            Ok(SharedPet {
                partnership_id: row.get(0)?,
                name: row.get(1)?,
                exp: row.get(2)?,
                level: row.get(3)?,
                last_fed: row.get(4)?,
            })
        })
        .optional()?;
    Ok(pet)
}

pub fn insert_pet(conn: &Connection, partnership_id: i64, name: &str) -> Result<bool, DbError> {
    let n = conn.execute(
        "INSERT INTO shared_pets (partnership_id, name, exp, level, last_fed)
         VALUES (?1, ?2, 0, 1, 0)
         ON CONFLICT(partnership_id) DO NOTHING",
        rusqlite::params![partnership_id, name],
    )?;
    Ok(n > 0)
}

pub fn update_pet(conn: &Connection, pet: &SharedPet) -> Result<(), DbError> {
    let n = conn.execute(
        "UPDATE shared_pets SET name = ?2, exp = ?3, level = ?4, last_fed = ?5
         WHERE partnership_id = ?1",
        rusqlite::params![pet.partnership_id, pet.name, pet.exp, pet.level, pet.last_fed],
    )?;
    if n == 0 {
        return Err(DbError::NotFound(format!("pet {}", pet.partnership_id)));
    }
    Ok(())
}

impl Database {
    pub fn get_relationship(&self, a: UserId, b: UserId) -> Result<Option<Relationship>, DbError> {
        self.with_conn(|conn| get(conn, a, b))
    }

    pub fn get_relationships_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Relationship>, DbError> {
        self.with_conn(|conn| list_for_user(conn, user_id, limit))
    }

    pub fn get_shared_pet(&self, partnership_id: i64) -> Result<Option<SharedPet>, DbError> {
        self.with_conn(|conn| get_pet(conn, partnership_id))
    }
}
