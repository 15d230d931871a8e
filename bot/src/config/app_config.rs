//! Runtime application configuration loaded from DB + environment overrides.

use chrono_tz::Tz;
use season_engine::{CompanionConfig, EngineConfig};

use super::manager::SettingsManager;

/// Runtime configuration populated from the settings DB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server_port: u16,
    pub timezone: String,
    pub daily_quest_count: usize,
    pub interaction_cooldown_secs: i64,
    pub affinity_per_interaction: i64,
    pub pet_feed_cooldown_secs: i64,
    pub pet_feed_exp: i64,
    pub leaderboard_default_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let companion = CompanionConfig::default();
        Self {
            server_port: 8080,
            timezone: "Asia/Ho_Chi_Minh".into(),
            daily_quest_count: season_engine::DEFAULT_DAILY_QUEST_COUNT,
            interaction_cooldown_secs: companion.interaction_cooldown_secs,
            affinity_per_interaction: companion.affinity_per_interaction,
            pet_feed_cooldown_secs: companion.pet_feed_cooldown_secs,
            pet_feed_exp: companion.pet_feed_exp,
            leaderboard_default_limit: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from the settings manager (DB-first, env overrides).
    pub fn load(sm: &SettingsManager) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> String { sm.get_setting(key).unwrap_or_default() };
        let d = Self::default();

        let mut server_port = parse_or(&g("SERVER_PORT"), d.server_port);
        let mut timezone = {
            let tz = g("TIMEZONE");
            if tz.is_empty() { d.timezone.clone() } else { tz }
        };

        // Environment variable overrides
        if let Ok(v) = std::env::var("SERVER_PORT") {
            if let Ok(p) = v.parse::<u16>() {
                server_port = p;
            }
        }
        if let Ok(v) = std::env::var("TIMEZONE") {
            if !v.is_empty() {
                timezone = v;
            }
        }

        Ok(Self {
            server_port,
            timezone,
            daily_quest_count: parse_or(&g("DAILY_QUEST_COUNT"), d.daily_quest_count),
            interaction_cooldown_secs: parse_or(
                &g("INTERACTION_COOLDOWN_SECS"),
                d.interaction_cooldown_secs,
            ),
            affinity_per_interaction: parse_or(
                &g("AFFINITY_PER_INTERACTION"),
                d.affinity_per_interaction,
            ),
            pet_feed_cooldown_secs: parse_or(&g("PET_FEED_COOLDOWN_SECS"), d.pet_feed_cooldown_secs),
            pet_feed_exp: parse_or(&g("PET_FEED_EXP"), d.pet_feed_exp),
            leaderboard_default_limit: parse_or(
                &g("LEADERBOARD_DEFAULT_LIMIT"),
                d.leaderboard_default_limit,
            ),
        })
    }

    /// Reload config from the settings manager.
    pub fn reload(&mut self, sm: &SettingsManager) -> Result<(), anyhow::Error> {
        *self = Self::load(sm)?;
        Ok(())
    }

    /// Configured zone, or the default zone when the name does not parse.
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!(timezone = %self.timezone, "Unknown TIMEZONE, using Asia/Ho_Chi_Minh");
            chrono_tz::Asia::Ho_Chi_Minh
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            timezone: self.tz(),
            daily_quest_count: self.daily_quest_count,
            companion: CompanionConfig {
                interaction_cooldown_secs: self.interaction_cooldown_secs,
                affinity_per_interaction: self.affinity_per_interaction,
                pet_feed_cooldown_secs: self.pet_feed_cooldown_secs,
                pet_feed_exp: self.pet_feed_exp,
            },
        }
    }
}

fn parse_or<T: std::str::FromStr>(s: &str, default: T) -> T {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_db::Database;

    #[test]
    fn test_load_reads_stored_settings() {
        let sm = SettingsManager::new(Database::open_in_memory().unwrap());
        sm.initialize_defaults().unwrap();
        sm.set_setting("PET_FEED_EXP", "40").unwrap();
        sm.set_setting("DAILY_QUEST_COUNT", "5").unwrap();

        let config = AppConfig::load(&sm).unwrap();
        assert_eq!(config.pet_feed_exp, 40);
        assert_eq!(config.daily_quest_count, 5);
        assert_eq!(config.leaderboard_default_limit, 10);

        let engine = config.engine_config();
        assert_eq!(engine.companion.pet_feed_exp, 40);
        assert_eq!(engine.daily_quest_count, 5);
    }

    #[test]
    fn test_bad_timezone_falls_back() {
        let config = AppConfig {
            timezone: "Nowhere/Land".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.tz(), chrono_tz::Asia::Ho_Chi_Minh);
    }
}
