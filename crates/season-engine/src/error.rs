//! Error taxonomy for engine operations.

use event_db::DbError;

use crate::state::StateError;

pub type Result<T, E = SeasonError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SeasonError {
    #[error("event '{0}' is already active")]
    AlreadyActive(String),

    #[error("event '{0}' has already ended")]
    AlreadyEnded(String),

    #[error("event '{0}' is not active")]
    NotActive(String),

    #[error("no active event")]
    NoActiveEvent,

    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("quest '{0}' not found")]
    QuestNotFound(String),

    #[error("quest '{quest_id}' is not complete ({progress}/{requirement})")]
    QuestNotComplete {
        quest_id: String,
        progress: i64,
        requirement: i64,
    },

    #[error("quest '{0}' was already claimed")]
    AlreadyClaimed(String),

    #[error("cannot interact with yourself")]
    SelfInteraction,

    #[error("on cooldown for another {remaining_secs}s")]
    OnCooldown { remaining_secs: i64 },

    #[error("relationship not found")]
    RelationshipNotFound,

    #[error("pet not found")]
    PetNotFound,

    #[error("this pair already has a pet")]
    PetAlreadyExists,

    #[error("invalid state for event '{event_key}': {source}")]
    InvalidState {
        event_key: String,
        #[source]
        source: StateError,
    },

    #[error(transparent)]
    Database(#[from] DbError),
}

impl SeasonError {
    /// Domain rejections a command handler reports back to the user, as
    /// opposed to infrastructure faults.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::InvalidState { .. })
    }
}
