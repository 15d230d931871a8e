use std::path::PathBuf;

use event_db::Database;

use crate::config::{AppConfig, SettingsManager};

/// Foundation init: .env, data dir, database, settings, config.
pub fn init_foundation() -> Result<(Database, AppConfig, PathBuf), anyhow::Error> {
    load_dotenv();
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;

    let db_path = dir.join("season.db");
    tracing::info!("Opening database at {}", db_path.display());
    let db = Database::open(&db_path)?;

    let sm = SettingsManager::new(db.clone());
    if let Err(e) = sm.migrate_from_env() {
        tracing::error!("Failed to migrate from env: {e}");
    }
    sm.initialize_defaults()?;

    let config = AppConfig::load(&sm)?;
    if config.timezone.parse::<chrono_tz::Tz>().is_err() {
        tracing::warn!(timezone = %config.timezone, "TIMEZONE is not a known zone");
    }

    tracing::info!(
        port = config.server_port,
        timezone = %config.timezone,
        "Settings loaded"
    );
    Ok((db, config, dir))
}

/// Determine the data directory for the application.
/// Priority: SEASON_BOT_DATA_DIR env var > ~/.season-bot
fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SEASON_BOT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".season-bot")
}

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}
