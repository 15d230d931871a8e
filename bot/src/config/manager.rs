//! SettingsManager: DB-backed settings with defaults and env migration.

use std::collections::{BTreeMap, HashMap};

use event_db::Database;

use super::SettingInfo;
use super::defaults::DEFAULT_SETTINGS;
use super::validation::validate_setting;

const SETTING_TYPE: &str = "normal";

/// Wraps [`Database`] to provide high-level settings operations.
pub struct SettingsManager {
    db: Database,
}

impl SettingsManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get a setting value. Falls back to default if not in DB.
    pub fn get_setting(&self, key: &str) -> Result<String, anyhow::Error> {
        if let Some(val) = self.db.get_setting(key)? {
            return Ok(val);
        }
        if let Some(def) = DEFAULT_SETTINGS.get(key) {
            return Ok(def.default.to_string());
        }
        anyhow::bail!("setting not found: {key}");
    }

    /// Set a setting value with validation.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        if !DEFAULT_SETTINGS.contains_key(key) {
            anyhow::bail!("unknown setting key: {key}");
        }
        validate_setting(key, value).map_err(|e| anyhow::anyhow!("validation error for {key}: {e}"))?;
        self.db.set_setting(key, value, SETTING_TYPE)?;
        Ok(())
    }

    /// Validate every entry first, then write them all. Nothing is stored
    /// if any entry is rejected.
    pub fn set_settings(&self, values: &BTreeMap<String, String>) -> Result<usize, anyhow::Error> {
        for (key, value) in values {
            if !DEFAULT_SETTINGS.contains_key(key.as_str()) {
                anyhow::bail!("unknown setting key: {key}");
            }
            validate_setting(key, value).map_err(|e| anyhow::anyhow!("{key}: {e}"))?;
        }
        let bulk: HashMap<String, String> = values.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        self.db.update_settings_bulk(&bulk)?;
        Ok(values.len())
    }

    /// Every known setting, with defaults for keys not stored yet.
    pub fn get_all_settings(&self) -> Result<BTreeMap<String, SettingInfo>, anyhow::Error> {
        let stored = self.db.get_all_settings()?;
        let result = DEFAULT_SETTINGS
            .values()
            .map(|def| {
                let stored_value = stored.get(def.key);
                let info = SettingInfo {
                    key: def.key.to_string(),
                    value: stored_value.cloned().unwrap_or_else(|| def.default.to_string()),
                    description: def.description.to_string(),
                    is_default: stored_value.is_none_or(|v| v == def.default),
                };
                (def.key.to_string(), info)
            })
            .collect();
        Ok(result)
    }

    /// Initialize default settings in DB (skip existing).
    pub fn initialize_defaults(&self) -> Result<(), anyhow::Error> {
        for def in DEFAULT_SETTINGS.values() {
            self.db.set_setting_if_absent(def.key, def.default, SETTING_TYPE)?;
        }
        Ok(())
    }

    /// Copy settings from environment variables into the DB (one-time).
    /// Keys already stored are left alone; invalid values are skipped.
    pub fn migrate_from_env(&self) -> Result<u32, anyhow::Error> {
        let mut migrated = 0u32;
        for key in DEFAULT_SETTINGS.keys() {
            if self.db.get_setting(key)?.is_some() {
                continue;
            }
            let Ok(env_val) = std::env::var(key) else {
                continue;
            };
            if env_val.is_empty() {
                continue;
            }
            if let Err(e) = validate_setting(key, &env_val) {
                tracing::warn!("Ignoring env value for {key}: {e}");
                continue;
            }
            self.db.set_setting(key, &env_val, SETTING_TYPE)?;
            tracing::info!("Migrated setting from env: {key}");
            migrated += 1;
        }
        if migrated > 0 {
            tracing::info!("Migration completed: {migrated} settings migrated");
        }
        Ok(migrated)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}
