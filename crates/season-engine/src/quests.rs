//! Quest tracker: daily and fixed quests, progress, and reward claims.

use chrono::{DateTime, Utc};
use event_db::quests::{self, QuestDefinition, QuestKind, QuestProgress};
use event_db::{Connection, Database, UserId, participation};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::clock::DayClock;
use crate::error::{Result, SeasonError};
use crate::{ledger, lifecycle};

/// A successful claim: the quest row after the flag flip and the balance
/// the reward was credited to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub quest: QuestProgress,
    pub reward: i64,
    pub balance: i64,
}

#[derive(Clone)]
pub struct QuestTracker {
    db: Database,
    clock: DayClock,
    daily_count: usize,
}

impl QuestTracker {
    pub fn new(db: Database, clock: DayClock, daily_count: usize) -> Self {
        Self {
            db,
            clock,
            daily_count,
        }
    }

    pub fn clock(&self) -> &DayClock {
        &self.clock
    }

    pub fn define_quest(&self, def: &QuestDefinition) -> Result<()> {
        if def.requirement_count <= 0 {
            return Err(SeasonError::InvalidAmount(def.requirement_count));
        }
        if def.reward < 0 {
            return Err(SeasonError::InvalidAmount(def.reward));
        }
        self.db.upsert_quest_definition(def)?;
        Ok(())
    }

    pub fn list_definitions(&self, event_key: &str) -> Result<Vec<QuestDefinition>> {
        Ok(self.db.get_quest_definitions(event_key, None)?)
    }

    pub fn refresh_daily_quests(&self, user_id: UserId) -> Result<Vec<QuestProgress>> {
        self.refresh_daily_quests_at(user_id, Utc::now())
    }

    /// Make sure the user holds today's daily set and every fixed quest of
    /// the active event. A second call on the same day changes nothing.
    pub fn refresh_daily_quests_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<QuestProgress>> {
        let day = self.clock.day_key(now);

        self.db.write_tx(|tx| {
            let event = lifecycle::load_active(tx)?.ok_or(SeasonError::NoActiveEvent)?;
            let event_key = event.event_key.as_str();

            for def in quests::list_definitions(tx, event_key, Some(QuestKind::Fixed))? {
                quests::assign(tx, user_id, &def, "")?;
            }

            if !quests::has_daily_for_day(tx, user_id, event_key, &day)? {
                let discarded = quests::delete_stale_daily(tx, user_id, event_key, &day)?;
                let pool = quests::list_definitions(tx, event_key, Some(QuestKind::Daily))?;
                let todays = select_daily_set(&pool, event_key, &day, self.daily_count);
                for def in &todays {
                    quests::assign(tx, user_id, def, &day)?;
                }
                tracing::debug!(
                    user_id,
                    event_key,
                    day = %day,
                    assigned = todays.len(),
                    discarded,
                    "Daily quests refreshed"
                );
            }

            Ok::<_, SeasonError>(quests::list_progress(tx, user_id, event_key)?)
        })
    }

    /// Quests of the active event held by the user.
    pub fn list_progress(&self, user_id: UserId) -> Result<Vec<QuestProgress>> {
        self.db.with_conn(|conn| {
            let event = lifecycle::load_active(conn)?.ok_or(SeasonError::NoActiveEvent)?;
            Ok(quests::list_progress(conn, user_id, &event.event_key)?)
        })
    }

    pub fn update_progress(
        &self,
        user_id: UserId,
        quest_id: &str,
        delta: i64,
    ) -> Result<QuestProgress> {
        self.update_progress_at(user_id, quest_id, delta, Utc::now())
    }

    /// Add `delta`, capped at the requirement. Capped or claimed quests are
    /// left as they are; a daily quest from another day is not found.
    pub fn update_progress_at(
        &self,
        user_id: UserId,
        quest_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<QuestProgress> {
        if delta < 0 {
            return Err(SeasonError::InvalidAmount(delta));
        }
        let day = self.clock.day_key(now);
        self.db.with_conn(|conn| {
            quests::advance(conn, user_id, quest_id, delta, &day)?;
            current_progress(conn, user_id, quest_id, &day)
        })
    }

    pub fn record_activity(
        &self,
        user_id: UserId,
        requirement_type: &str,
        amount: i64,
    ) -> Result<Vec<QuestProgress>> {
        self.record_activity_at(user_id, requirement_type, amount, Utc::now())
    }

    /// Feed an activity (e.g. `fish`, `chat`) into every open quest of the
    /// active event that tracks it. Returns quests completed by this call.
    pub fn record_activity_at(
        &self,
        user_id: UserId,
        requirement_type: &str,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<QuestProgress>> {
        if amount < 0 {
            return Err(SeasonError::InvalidAmount(amount));
        }
        let day = self.clock.day_key(now);
        self.db.write_tx(|tx| {
            let event = lifecycle::load_active(tx)?.ok_or(SeasonError::NoActiveEvent)?;
            let open =
                quests::open_quests_by_type(tx, user_id, &event.event_key, requirement_type, &day)?;

            let mut completed = Vec::new();
            for quest_id in open {
                quests::advance(tx, user_id, &quest_id, amount, &day)?;
                if let Some(progress) = quests::get_progress(tx, user_id, &quest_id)? {
                    if progress.is_complete() {
                        completed.push(progress);
                    }
                }
            }
            Ok::<_, SeasonError>(completed)
        })
    }

    pub fn claim_reward(&self, user_id: UserId, quest_id: &str) -> Result<ClaimOutcome> {
        self.claim_reward_at(user_id, quest_id, Utc::now())
    }

    /// Flip the claim flag and credit the reward in one transaction.
    pub fn claim_reward_at(
        &self,
        user_id: UserId,
        quest_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let day = self.clock.day_key(now);
        let outcome = self.db.write_tx(|tx| {
            if quests::mark_claimed(tx, user_id, quest_id, &day)? == 0 {
                let progress = current_progress(tx, user_id, quest_id, &day)?;
                if progress.claimed {
                    return Err(SeasonError::AlreadyClaimed(quest_id.to_string()));
                }
                return Err(SeasonError::QuestNotComplete {
                    quest_id: quest_id.to_string(),
                    progress: progress.progress_count,
                    requirement: progress.requirement,
                });
            }

            let quest = current_progress(tx, user_id, quest_id, &day)?;
            ledger::credit_or_reject(tx, user_id, &quest.event_key, quest.reward)?;
            let record = participation::get_or_create(tx, user_id, &quest.event_key)?;

            Ok(ClaimOutcome {
                reward: quest.reward,
                balance: record.currency_balance,
                quest,
            })
        })?;

        tracing::info!(
            user_id,
            quest_id,
            reward = outcome.reward,
            "Quest reward claimed"
        );
        Ok(outcome)
    }
}

/// The user's row for `quest_id`, treating a daily row of another day as gone.
fn current_progress(
    conn: &Connection,
    user_id: UserId,
    quest_id: &str,
    day: &str,
) -> Result<QuestProgress> {
    quests::get_progress(conn, user_id, quest_id)?
        .filter(|p| p.is_current(day))
        .ok_or_else(|| SeasonError::QuestNotFound(quest_id.to_string()))
}

/// The day's daily quests: `count` definitions drawn from the pool with an
/// RNG seeded by event and day, so everyone gets the same set that day.
/// Returned in quest id order.
pub fn select_daily_set<'a>(
    pool: &'a [QuestDefinition],
    event_key: &str,
    day: &str,
    count: usize,
) -> Vec<&'a QuestDefinition> {
    let mut picked: Vec<&QuestDefinition> = if count >= pool.len() {
        pool.iter().collect()
    } else {
        let mut rng = StdRng::seed_from_u64(day_seed(event_key, day));
        pool.choose_multiple(&mut rng, count).collect()
    };
    picked.sort_by(|a, b| a.quest_id.cmp(&b.quest_id));
    picked
}

/// FNV-1a over `event_key` and `day`; stable across runs and platforms.
fn day_seed(event_key: &str, day: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    event_key
        .bytes()
        .chain(std::iter::once(0))
        .chain(day.bytes())
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

#[cfg(test)]
#[path = "quests_tests.rs"]
mod tests;
