//! Seasonal event lifecycle: INACTIVE (no row) → ACTIVE → ENDED.
//!
//! Only one event is active at a time. An ended event keeps its final state
//! for leaderboards until an administrator resets it, after which the key
//! can be started again from scratch.

use chrono::Utc;
use event_db::{Connection, Database, event_state, quests};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeasonError};
use crate::state::{self, EventSetup, EventState, EventStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonalEvent {
    pub event_key: String,
    pub state: EventState,
    pub updated_at: String,
}

impl SeasonalEvent {
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

/// Result of adding to the community counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressOutcome {
    pub event_key: String,
    pub total: i64,
    /// Thresholds crossed for the first time by this update.
    pub reached: Vec<i64>,
    pub next_milestone: Option<i64>,
}

#[derive(Clone)]
pub struct EventManager {
    db: Database,
}

impl EventManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn start_event(&self, event_key: &str, setup: EventSetup) -> Result<SeasonalEvent> {
        let event = self.db.write_tx(|tx| {
            if let Some(active) = load_active(tx)? {
                return Err(SeasonError::AlreadyActive(active.event_key));
            }
            if let Some(existing) = load_event(tx, event_key)? {
                if existing.state.status == EventStatus::Ended {
                    return Err(SeasonError::AlreadyEnded(existing.event_key));
                }
            }

            let state = setup.into_state(Utc::now());
            store(tx, event_key, &state)?;
            require_event(tx, event_key)
        })?;

        tracing::info!(
            event_key,
            milestones = ?event.state.milestones,
            "Seasonal event started"
        );
        Ok(event)
    }

    pub fn end_event(&self, event_key: &str) -> Result<SeasonalEvent> {
        let event = self.db.write_tx(|tx| {
            let mut event = match load_event(tx, event_key)? {
                Some(event) if event.is_active() => event,
                _ => return Err(SeasonError::NotActive(event_key.to_string())),
            };
            event.state.end(Utc::now());
            store(tx, event_key, &event.state)?;
            require_event(tx, event_key)
        })?;

        tracing::info!(
            event_key,
            community_total = event.state.community_total,
            "Seasonal event ended"
        );
        Ok(event)
    }

    pub fn get_active_event(&self) -> Result<Option<SeasonalEvent>> {
        self.db.with_conn(load_active)
    }

    pub fn get_event(&self, event_key: &str) -> Result<Option<SeasonalEvent>> {
        self.db.with_conn(|conn| load_event(conn, event_key))
    }

    /// Every stored event. Rows that fail to decode are skipped with a warning.
    pub fn list_events(&self) -> Result<Vec<SeasonalEvent>> {
        let rows = self.db.list_event_states()?;
        let events = rows
            .into_iter()
            .filter_map(|row| match state::decode(&row.state_data) {
                Ok(state) => Some(SeasonalEvent {
                    event_key: row.event_key,
                    state,
                    updated_at: row.updated_at,
                }),
                Err(error) => {
                    tracing::warn!(event_key = %row.event_key, %error, "Skipping undecodable event state");
                    None
                }
            })
            .collect();
        Ok(events)
    }

    pub fn record_community_progress(&self, event_key: &str, amount: i64) -> Result<ProgressOutcome> {
        if amount < 0 {
            return Err(SeasonError::InvalidAmount(amount));
        }
        self.db.write_tx(|tx| apply_progress(tx, event_key, amount))
    }

    pub fn set_phase(&self, event_key: &str, phase: Option<String>) -> Result<SeasonalEvent> {
        self.db.write_tx(|tx| {
            let mut event = match load_event(tx, event_key)? {
                Some(event) if event.is_active() => event,
                _ => return Err(SeasonError::NotActive(event_key.to_string())),
            };
            event.state.phase = phase;
            store(tx, event_key, &event.state)?;
            require_event(tx, event_key)
        })
    }

    /// Administrative reset: drop the state row and the event's quest
    /// progress. Participation rows are kept as history.
    pub fn reset_event(&self, event_key: &str) -> Result<bool> {
        let (existed, quests_removed) = self.db.write_tx(|tx| {
            let existed = event_state::delete(tx, event_key)?;
            let removed = quests::delete_progress_for_event(tx, event_key)?;
            Ok::<_, SeasonError>((existed, removed))
        })?;

        tracing::info!(event_key, existed, quests_removed, "Seasonal event reset");
        Ok(existed)
    }
}

fn decode_row(row: event_state::EventStateRow) -> Result<SeasonalEvent> {
    let state = state::decode(&row.state_data).map_err(|source| SeasonError::InvalidState {
        event_key: row.event_key.clone(),
        source,
    })?;
    Ok(SeasonalEvent {
        event_key: row.event_key,
        state,
        updated_at: row.updated_at,
    })
}

fn store(conn: &Connection, event_key: &str, state: &EventState) -> Result<()> {
    let data = state::encode(state).map_err(|source| SeasonError::InvalidState {
        event_key: event_key.to_string(),
        source,
    })?;
    event_state::put(conn, event_key, &data)?;
    Ok(())
}

fn require_event(conn: &Connection, event_key: &str) -> Result<SeasonalEvent> {
    load_event(conn, event_key)?
        .ok_or_else(|| event_db::DbError::NotFound(format!("event {event_key}")).into())
}

pub(crate) fn load_event(conn: &Connection, event_key: &str) -> Result<Option<SeasonalEvent>> {
    event_state::get(conn, event_key)?.map(decode_row).transpose()
}

/// The most recently updated active event. Untagged legacy rows count as
/// active, matching how they decode.
pub(crate) fn load_active(conn: &Connection) -> Result<Option<SeasonalEvent>> {
    let rows = event_state::find_by_status(conn, EventStatus::Active.as_str(), true)?;
    for row in rows {
        let event = decode_row(row)?;
        if event.is_active() {
            return Ok(Some(event));
        }
    }
    Ok(None)
}

/// Read-modify-write of the community counter. Callers run this inside an
/// IMMEDIATE transaction so the milestone check cannot race.
pub(crate) fn apply_progress(
    conn: &Connection,
    event_key: &str,
    amount: i64,
) -> Result<ProgressOutcome> {
    let mut event = match load_event(conn, event_key)? {
        Some(event) if event.is_active() => event,
        _ => return Err(SeasonError::NoActiveEvent),
    };

    let reached = event.state.add_progress(amount);
    store(conn, event_key, &event.state)?;

    for milestone in &reached {
        tracing::info!(
            event_key,
            milestone,
            total = event.state.community_total,
            "Community milestone reached"
        );
    }

    Ok(ProgressOutcome {
        event_key: event_key.to_string(),
        total: event.state.community_total,
        next_milestone: event.state.next_milestone(),
        reached,
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
