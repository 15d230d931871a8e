//! Relationships between pairs of users and the pet each pair can raise.

use chrono::Utc;
use event_db::relationships::{self, Relationship, SharedPet};
use event_db::{Connection, Database, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeasonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionConfig {
    pub interaction_cooldown_secs: i64,
    pub affinity_per_interaction: i64,
    pub pet_feed_cooldown_secs: i64,
    pub pet_feed_exp: i64,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            interaction_cooldown_secs: 3600,
            affinity_per_interaction: 5,
            pet_feed_cooldown_secs: 14_400,
            pet_feed_exp: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractOutcome {
    pub relationship: Relationship,
    /// First interaction of the pair.
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedOutcome {
    pub pet: SharedPet,
    pub exp_gained: i64,
    pub levels_gained: i64,
}

/// Experience needed to go from `level` to `level + 1`.
pub fn exp_to_next(level: i64) -> i64 {
    level.max(1) * 100
}

/// Add `gain` exp and level up as many times as it covers, keeping the
/// remainder. Returns the number of levels gained.
pub fn apply_exp(pet: &mut SharedPet, gain: i64) -> i64 {
    pet.exp += gain;
    let mut levels = 0;
    while pet.exp >= exp_to_next(pet.level) {
        pet.exp -= exp_to_next(pet.level);
        pet.level += 1;
        levels += 1;
    }
    levels
}

#[derive(Clone)]
pub struct Companion {
    db: Database,
    config: CompanionConfig,
}

impl Companion {
    pub fn new(db: Database, config: CompanionConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &CompanionConfig {
        &self.config
    }

    pub fn interact(&self, a: UserId, b: UserId) -> Result<InteractOutcome> {
        self.interact_at(a, b, Utc::now().timestamp())
    }

    /// Create the pair on first contact, otherwise add affinity once the
    /// cooldown has passed. `now` is unix seconds.
    pub fn interact_at(&self, a: UserId, b: UserId, now: i64) -> Result<InteractOutcome> {
        if a == b {
            return Err(SeasonError::SelfInteraction);
        }
        let gain = self.config.affinity_per_interaction;
        let cooldown = self.config.interaction_cooldown_secs;

        let outcome = self.db.write_tx(|tx| {
            let created = relationships::insert(tx, a, b, gain, now)?;
            if !created && relationships::bump_affinity(tx, a, b, gain, now, cooldown)? == 0 {
                let rel = require_relationship(tx, a, b)?;
                return Err(SeasonError::OnCooldown {
                    remaining_secs: remaining(rel.last_interaction, cooldown, now),
                });
            }
            Ok(InteractOutcome {
                relationship: require_relationship(tx, a, b)?,
                created,
            })
        })?;

        tracing::debug!(
            a,
            b,
            affinity = outcome.relationship.affinity,
            created = outcome.created,
            "Interaction recorded"
        );
        Ok(outcome)
    }

    pub fn get_relationship(&self, a: UserId, b: UserId) -> Result<Option<Relationship>> {
        Ok(self.db.get_relationship(a, b)?)
    }

    pub fn top_relationships(&self, user_id: UserId, limit: usize) -> Result<Vec<Relationship>> {
        Ok(self.db.get_relationships_for_user(user_id, limit)?)
    }

    pub fn adopt_pet(&self, a: UserId, b: UserId, name: &str) -> Result<SharedPet> {
        let name = name.trim();
        if a == b {
            return Err(SeasonError::SelfInteraction);
        }

        let pet = self.db.write_tx(|tx| {
            let rel = require_relationship(tx, a, b)?;
            if !relationships::insert_pet(tx, rel.id, name)? {
                return Err(SeasonError::PetAlreadyExists);
            }
            relationships::get_pet(tx, rel.id)?.ok_or(SeasonError::PetNotFound)
        })?;

        tracing::info!(partnership_id = pet.partnership_id, name = %pet.name, "Pet adopted");
        Ok(pet)
    }

    pub fn get_pet(&self, a: UserId, b: UserId) -> Result<Option<SharedPet>> {
        self.db.with_conn(|conn| match relationships::get(conn, a, b)? {
            Some(rel) => Ok(relationships::get_pet(conn, rel.id)?),
            None => Ok(None),
        })
    }

    pub fn feed_pet(&self, a: UserId, b: UserId) -> Result<FeedOutcome> {
        self.feed_pet_at(a, b, Utc::now().timestamp())
    }

    pub fn feed_pet_at(&self, a: UserId, b: UserId, now: i64) -> Result<FeedOutcome> {
        let gain = self.config.pet_feed_exp;
        let cooldown = self.config.pet_feed_cooldown_secs;

        let outcome = self.db.write_tx(|tx| {
            let rel = require_relationship(tx, a, b)?;
            let mut pet = relationships::get_pet(tx, rel.id)?.ok_or(SeasonError::PetNotFound)?;
            if pet.last_fed > 0 && now - pet.last_fed < cooldown {
                return Err(SeasonError::OnCooldown {
                    remaining_secs: remaining(pet.last_fed, cooldown, now),
                });
            }

            let levels_gained = apply_exp(&mut pet, gain);
            pet.last_fed = now;
            relationships::update_pet(tx, &pet)?;
            Ok(FeedOutcome {
                pet,
                exp_gained: gain,
                levels_gained,
            })
        })?;

        if outcome.levels_gained > 0 {
            tracing::info!(
                partnership_id = outcome.pet.partnership_id,
                level = outcome.pet.level,
                "Pet levelled up"
            );
        }
        Ok(outcome)
    }
}

fn require_relationship(conn: &Connection, a: UserId, b: UserId) -> Result<Relationship> {
    relationships::get(conn, a, b)?.ok_or(SeasonError::RelationshipNotFound)
}

fn remaining(last: i64, cooldown: i64, now: i64) -> i64 {
    (last + cooldown - now).max(1)
}
