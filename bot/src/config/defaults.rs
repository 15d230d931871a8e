//! All setting definitions with their default values.

use std::collections::BTreeMap;
use std::sync::LazyLock;

/// (key, default, description)
type DefTuple = (&'static str, &'static str, &'static str);

const DEFS: &[DefTuple] = &[
    ("SERVER_PORT", "8080", "HTTP port of the command API"),
    (
        "TIMEZONE",
        "Asia/Ho_Chi_Minh",
        "IANA time zone whose local midnight rolls daily quests over",
    ),
    ("DAILY_QUEST_COUNT", "3", "Daily quests handed out per user per day"),
    (
        "INTERACTION_COOLDOWN_SECS",
        "3600",
        "Seconds between affinity gains for the same pair",
    ),
    ("AFFINITY_PER_INTERACTION", "5", "Affinity added per interaction"),
    ("PET_FEED_COOLDOWN_SECS", "14400", "Seconds between feedings of a shared pet"),
    ("PET_FEED_EXP", "25", "Experience a feeding gives"),
    ("LEADERBOARD_DEFAULT_LIMIT", "10", "Rows shown by the leaderboard command"),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<BTreeMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}
