//! Typed, versioned contents of `global_event_state.state_data`.
//!
//! Version 1 is a JSON object with an explicit `version` field. Blobs written
//! before versioning (plain maps without `version`) are upgraded on read:
//! they decode as an active event, keep every key under `extra`, and seed
//! `community_total` from a numeric `community_total` or `community_progress`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATE_VERSION: u64 = 1;

const LEGACY_TOTAL_KEYS: &[&str] = &["community_total", "community_progress"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Ended,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventState {
    pub version: u64,
    pub status: EventStatus,
    #[serde(default)]
    pub community_total: i64,
    /// Ascending thresholds on `community_total`.
    #[serde(default)]
    pub milestones: Vec<i64>,
    /// Thresholds that have already been signalled.
    #[serde(default)]
    pub reached_milestones: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Event-specific data that has no dedicated field.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

/// Parameters for starting an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventSetup {
    #[serde(default)]
    pub milestones: Vec<i64>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl EventSetup {
    pub fn with_milestones(mut self, milestones: impl IntoIterator<Item = i64>) -> Self {
        self.milestones = milestones.into_iter().collect();
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Fresh active state. Non-positive thresholds are dropped, the rest
    /// sorted and deduplicated.
    pub fn into_state(self, now: DateTime<Utc>) -> EventState {
        let mut milestones: Vec<i64> = self.milestones.into_iter().filter(|m| *m > 0).collect();
        milestones.sort_unstable();
        milestones.dedup();

        EventState {
            version: STATE_VERSION,
            status: EventStatus::Active,
            community_total: 0,
            milestones,
            reached_milestones: Vec::new(),
            phase: self.phase,
            started_at: Some(now),
            ended_at: None,
            extra: self.extra,
        }
    }
}

impl EventState {
    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }

    /// Add to the community counter and return the thresholds crossed for
    /// the first time, in ascending order.
    pub fn add_progress(&mut self, amount: i64) -> Vec<i64> {
        self.community_total = self.community_total.saturating_add(amount);

        let mut newly_reached = Vec::new();
        for &threshold in &self.milestones {
            if threshold > self.community_total {
                break;
            }
            if !self.reached_milestones.contains(&threshold) {
                newly_reached.push(threshold);
            }
        }
        self.reached_milestones.extend_from_slice(&newly_reached);
        newly_reached
    }

    /// The lowest threshold not reached yet.
    pub fn next_milestone(&self) -> Option<i64> {
        self.milestones
            .iter()
            .copied()
            .find(|m| !self.reached_milestones.contains(m))
    }

    pub fn end(&mut self, now: DateTime<Utc>) {
        self.status = EventStatus::Ended;
        self.ended_at = Some(now);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("malformed state json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state data is not a json object")]
    NotAnObject,

    #[error("unsupported state version {0}")]
    UnsupportedVersion(u64),
}

pub fn encode(state: &EventState) -> Result<String, StateError> {
    Ok(serde_json::to_string(state)?)
}

pub fn decode(raw: &str) -> Result<EventState, StateError> {
    if raw.trim().is_empty() {
        return Ok(upgrade_legacy(Map::new()));
    }

    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(map) = value else {
        return Err(StateError::NotAnObject);
    };

    match map.get("version").and_then(Value::as_u64) {
        Some(STATE_VERSION) => Ok(serde_json::from_value(Value::Object(map))?),
        Some(other) => Err(StateError::UnsupportedVersion(other)),
        None => Ok(upgrade_legacy(map)),
    }
}

fn upgrade_legacy(extra: Map<String, Value>) -> EventState {
    let community_total = LEGACY_TOTAL_KEYS
        .iter()
        .find_map(|key| extra.get(*key).and_then(Value::as_i64))
        .unwrap_or(0);

    EventState {
        version: STATE_VERSION,
        status: EventStatus::Active,
        community_total,
        milestones: Vec::new(),
        reached_milestones: Vec::new(),
        phase: extra
            .get("phase")
            .and_then(Value::as_str)
            .map(str::to_string),
        started_at: None,
        ended_at: None,
        extra,
    }
}
