//! Participation ledger: per-user currency and contribution for an event.

use event_db::participation::{self, LeaderboardEntry, ParticipationRecord};
use event_db::{Connection, Database, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeasonError};
use crate::lifecycle::{self, ProgressOutcome};

/// Result of a user donating currency to the community goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContributionOutcome {
    pub record: ParticipationRecord,
    pub progress: ProgressOutcome,
}

#[derive(Clone)]
pub struct Ledger {
    db: Database,
}

impl Ledger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn get_or_create(&self, user_id: UserId, event_key: &str) -> Result<ParticipationRecord> {
        Ok(self.db.get_or_create_participation(user_id, event_key)?)
    }

    pub fn add_currency(
        &self,
        user_id: UserId,
        event_key: &str,
        amount: i64,
    ) -> Result<ParticipationRecord> {
        ensure_non_negative(amount)?;
        self.db.with_conn(|conn| {
            credit_or_reject(conn, user_id, event_key, amount)?;
            reload(conn, user_id, event_key)
        })
    }

    /// Atomic check-and-decrement; a short balance is left untouched.
    pub fn spend_currency(
        &self,
        user_id: UserId,
        event_key: &str,
        amount: i64,
    ) -> Result<ParticipationRecord> {
        ensure_non_negative(amount)?;
        self.db.with_conn(|conn| {
            debit_or_reject(conn, user_id, event_key, amount)?;
            reload(conn, user_id, event_key)
        })
    }

    pub fn record_contribution(
        &self,
        user_id: UserId,
        event_key: &str,
        amount: i64,
    ) -> Result<ParticipationRecord> {
        ensure_non_negative(amount)?;
        self.db.with_conn(|conn| {
            participation::ensure(conn, user_id, event_key)?;
            contribution_or_reject(conn, user_id, event_key, amount)?;
            reload(conn, user_id, event_key)
        })
    }

    /// Spend `amount` of the user's currency on the active event's community
    /// goal: debit, contribution and community progress commit together.
    pub fn contribute(&self, user_id: UserId, amount: i64) -> Result<ContributionOutcome> {
        if amount <= 0 {
            return Err(SeasonError::InvalidAmount(amount));
        }

        let outcome = self.db.write_tx(|tx| {
            let event = lifecycle::load_active(tx)?.ok_or(SeasonError::NoActiveEvent)?;
            let event_key = event.event_key.as_str();

            debit_or_reject(tx, user_id, event_key, amount)?;
            contribution_or_reject(tx, user_id, event_key, amount)?;
            let progress = lifecycle::apply_progress(tx, event_key, amount)?;
            let record = reload(tx, user_id, event_key)?;
            Ok::<_, SeasonError>(ContributionOutcome { record, progress })
        })?;

        tracing::info!(
            user_id,
            event_key = %outcome.progress.event_key,
            amount,
            total = outcome.progress.total,
            "Contribution recorded"
        );
        Ok(outcome)
    }

    pub fn get_leaderboard(&self, event_key: &str, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        Ok(self.db.get_leaderboard(event_key, limit)?)
    }

    pub fn get_rank(&self, user_id: UserId, event_key: &str) -> Result<Option<i64>> {
        Ok(self.db.get_participation_rank(user_id, event_key)?)
    }
}

fn ensure_non_negative(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(SeasonError::InvalidAmount(amount));
    }
    Ok(())
}

fn reload(conn: &Connection, user_id: UserId, event_key: &str) -> Result<ParticipationRecord> {
    Ok(participation::get_or_create(conn, user_id, event_key)?)
}

/// Credit an existing or new row; a balance that would overflow is rejected
/// as an invalid amount and left as it was.
pub(crate) fn credit_or_reject(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
    amount: i64,
) -> Result<()> {
    participation::ensure(conn, user_id, event_key)?;
    match participation::credit(conn, user_id, event_key, amount)? {
        0 => Err(SeasonError::InvalidAmount(amount)),
        _ => Ok(()),
    }
}

fn contribution_or_reject(
    conn: &Connection,
    user_id: UserId,
    event_key: &str,
    amount: i64,
) -> Result<()> {
    match participation::add_contribution(conn, user_id, event_key, amount)? {
        0 => Err(SeasonError::InvalidAmount(amount)),
        _ => Ok(()),
    }
}

fn debit_or_reject(conn: &Connection, user_id: UserId, event_key: &str, amount: i64) -> Result<()> {
    participation::ensure(conn, user_id, event_key)?;
    if participation::debit(conn, user_id, event_key, amount)? == 1 {
        return Ok(());
    }
    let balance = participation::get(conn, user_id, event_key)?
        .map(|r| r.currency_balance)
        .unwrap_or(0);
    Err(SeasonError::InsufficientFunds {
        balance,
        requested: amount,
    })
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
