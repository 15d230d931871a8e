use std::path::PathBuf;
use std::sync::Arc;

use event_db::Database;
use season_engine::SeasonEngine;
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, SettingsManager};

/// A community milestone crossed by some command, fanned out to listeners.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MilestoneReached {
    pub event_key: String,
    pub milestone: i64,
    pub total: i64,
}

/// Application shared state handed to every command and axum handler.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Broadcast channel for milestone announcements
    milestone_tx: broadcast::Sender<MilestoneReached>,
    /// Application configuration (reloadable)
    config: RwLock<AppConfig>,
    /// Engine built from the current config; rebuilt on reload
    engine: RwLock<SeasonEngine>,
    /// Database handle
    db: Database,
    /// Data directory path
    data_dir: PathBuf,
    /// Cancelled once on shutdown
    shutdown: CancellationToken,
}

impl SharedState {
    /// Create shared state from an already-opened database and loaded config.
    pub fn new(db: Database, config: AppConfig, data_dir: PathBuf) -> Self {
        let (milestone_tx, _) = broadcast::channel(256);
        let engine = SeasonEngine::new(db.clone(), config.engine_config());

        Self {
            inner: Arc::new(SharedStateInner {
                milestone_tx,
                config: RwLock::new(config),
                engine: RwLock::new(engine),
                db,
                data_dir,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn server_port(&self) -> u16 {
        self.inner
            .config
            .try_read()
            .map(|c| c.server_port)
            .unwrap_or(8080)
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.inner.data_dir
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    pub fn subscribe_milestones(&self) -> broadcast::Receiver<MilestoneReached> {
        self.inner.milestone_tx.subscribe()
    }

    /// Announce crossed milestones. Having no listener is fine.
    pub fn publish_milestones(&self, event_key: &str, reached: &[i64], total: i64) {
        for &milestone in reached {
            let _ = self.inner.milestone_tx.send(MilestoneReached {
                event_key: event_key.to_string(),
                milestone,
                total,
            });
        }
    }

    /// Get a read lock on the current config.
    pub async fn config(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.config.read().await
    }

    pub async fn engine(&self) -> SeasonEngine {
        self.inner.engine.read().await.clone()
    }

    /// Run a synchronous engine call on the blocking pool.
    ///
    /// The closure owns its engine handle, so dropping the returned future
    /// does not abort a write that has already started.
    pub async fn run_engine<F, R>(&self, f: F) -> Result<R, JoinError>
    where
        F: FnOnce(SeasonEngine) -> R + Send + 'static,
        R: Send + 'static,
    {
        let engine = self.engine().await;
        tokio::task::spawn_blocking(move || f(engine)).await
    }

    /// Reload config from the database and rebuild the engine with it.
    pub async fn reload_config(&self) -> Result<(), anyhow::Error> {
        let sm = SettingsManager::new(self.inner.db.clone());
        let mut config = self.inner.config.write().await;
        config.reload(&sm)?;
        *self.inner.engine.write().await = SeasonEngine::new(self.inner.db.clone(), config.engine_config());
        tracing::info!(timezone = %config.timezone, "Config reloaded");
        Ok(())
    }
}
