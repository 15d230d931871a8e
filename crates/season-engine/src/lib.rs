//! Seasonal events core: event lifecycle, participation ledger, quests and
//! the relationship / shared pet companion feature.
//!
//! Components hold a cloned [`Database`] handle and are cheap to clone.
//! Every mutation of a shared counter is one conditional statement or one
//! `BEGIN IMMEDIATE` transaction, so interleaved callers never lose updates.

pub mod clock;
pub mod companion;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod quests;
pub mod state;

use chrono_tz::Tz;
use event_db::Database;

pub use clock::DayClock;
pub use companion::{Companion, CompanionConfig};
pub use error::{Result, SeasonError};
pub use ledger::Ledger;
pub use lifecycle::{EventManager, ProgressOutcome, SeasonalEvent};
pub use quests::QuestTracker;
pub use state::{EventSetup, EventState, EventStatus};

pub const DEFAULT_DAILY_QUEST_COUNT: usize = 3;

/// Tunables shared by the engine components.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Daily quests roll over at local midnight in this zone.
    pub timezone: Tz,
    pub daily_quest_count: usize,
    pub companion: CompanionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Ho_Chi_Minh,
            daily_quest_count: DEFAULT_DAILY_QUEST_COUNT,
            companion: CompanionConfig::default(),
        }
    }
}

/// All engine components over one database.
#[derive(Clone)]
pub struct SeasonEngine {
    pub events: EventManager,
    pub ledger: Ledger,
    pub quests: QuestTracker,
    pub companion: Companion,
}

impl SeasonEngine {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        let clock = DayClock::new(config.timezone);
        Self {
            events: EventManager::new(db.clone()),
            ledger: Ledger::new(db.clone()),
            quests: QuestTracker::new(db.clone(), clock, config.daily_quest_count),
            companion: Companion::new(db, config.companion),
        }
    }
}
