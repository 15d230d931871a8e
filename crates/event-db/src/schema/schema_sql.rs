pub(super) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    setting_type TEXT NOT NULL DEFAULT 'normal',
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS server_config (
    guild_id INTEGER PRIMARY KEY,
    admin_channel_id INTEGER,
    noitu_channel_id INTEGER
);

CREATE TABLE IF NOT EXISTS global_event_state (
    event_key TEXT PRIMARY KEY,
    state_data TEXT,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS event_participation (
    user_id INTEGER NOT NULL,
    event_key TEXT NOT NULL,
    currency_balance INTEGER NOT NULL DEFAULT 0 CHECK (currency_balance >= 0),
    contribution_total INTEGER NOT NULL DEFAULT 0 CHECK (contribution_total >= 0),
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (user_id, event_key)
);

CREATE TABLE IF NOT EXISTS quest_definitions (
    quest_id TEXT PRIMARY KEY,
    event_key TEXT NOT NULL,
    kind TEXT NOT NULL CHECK(kind IN ('daily', 'fixed')),
    requirement_type TEXT NOT NULL,
    requirement_count INTEGER NOT NULL CHECK (requirement_count > 0),
    reward INTEGER NOT NULL DEFAULT 0 CHECK (reward >= 0),
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS quest_progress (
    user_id INTEGER NOT NULL,
    quest_id TEXT NOT NULL,
    event_key TEXT NOT NULL,
    kind TEXT NOT NULL CHECK(kind IN ('daily', 'fixed')),
    quest_day TEXT NOT NULL DEFAULT '',
    requirement_type TEXT NOT NULL,
    requirement INTEGER NOT NULL,
    reward INTEGER NOT NULL DEFAULT 0,
    progress_count INTEGER NOT NULL DEFAULT 0,
    claimed BOOLEAN NOT NULL DEFAULT false,
    claimed_at TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (user_id, quest_id)
);

CREATE TABLE IF NOT EXISTS relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_low INTEGER NOT NULL,
    user_high INTEGER NOT NULL,
    affinity INTEGER NOT NULL DEFAULT 0,
    last_interaction INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(user_low, user_high),
    CHECK (user_low < user_high)
);

CREATE TABLE IF NOT EXISTS shared_pets (
    partnership_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    exp INTEGER NOT NULL DEFAULT 0,
    level INTEGER NOT NULL DEFAULT 1,
    last_fed INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (partnership_id) REFERENCES relationships(id) ON DELETE CASCADE
);
"#;

/// Indexes are created after legacy migrations so that they can reference
/// columns added by those migrations.
pub(super) const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_event_participation_leaderboard
    ON event_participation(event_key, contribution_total DESC, user_id ASC);

CREATE INDEX IF NOT EXISTS idx_quest_definitions_event
    ON quest_definitions(event_key, kind);

CREATE INDEX IF NOT EXISTS idx_quest_progress_user_event
    ON quest_progress(user_id, event_key, kind);
"#;
